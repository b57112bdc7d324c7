use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ReadRoom account, keyed by the identifier issued by the external
/// platform the user signs in with.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: i64,
    pub external_id: String,
    pub full_name: Option<String>,
    pub pseudonym: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// An active author account with no profile fields filled in.
    pub fn new(id: i64, external_id: impl Into<String>) -> Self {
        Self {
            id,
            external_id: external_id.into(),
            full_name: None,
            pseudonym: None,
            bio: None,
            avatar_url: None,
            role: "AUTHOR".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Fields supplied at registration. Role and activity take their defaults.
#[derive(Debug, Clone, Default)]
pub struct NewIdentity {
    pub external_id: String,
    pub full_name: Option<String>,
    pub pseudonym: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Body of `PUT /users/me`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub pseudonym: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Apply the present fields to `identity`.
    pub fn apply_to(&self, identity: &mut Identity) {
        if let Some(v) = &self.full_name {
            identity.full_name = Some(v.clone());
        }
        if let Some(v) = &self.pseudonym {
            identity.pseudonym = Some(v.clone());
        }
        if let Some(v) = &self.bio {
            identity.bio = Some(v.clone());
        }
        if let Some(v) = &self.avatar_url {
            identity.avatar_url = Some(v.clone());
        }
        identity.updated_at = Some(Utc::now());
    }
}

/// Public view returned by `GET /users/me`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub id: i64,
    pub external_id: String,
    pub full_name: Option<String>,
    pub pseudonym: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Identity> for IdentityProfile {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            external_id: identity.external_id,
            full_name: identity.full_name,
            pseudonym: identity.pseudonym,
            bio: identity.bio,
            avatar_url: identity.avatar_url,
            role: identity.role,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}
