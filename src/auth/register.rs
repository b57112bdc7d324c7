use serde::Deserialize;

use super::login::ExternalId;
use super::CredentialVerifier;
use crate::errors::AppError;
use crate::models::identity::{Identity, NewIdentity};
use crate::store::IdentityStore;

/// Body of `POST /users/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub vk_id: ExternalId,
    /// Launch URL proving ownership of `vk_id`.
    pub url: String,
    pub full_name: String,
    pub pseudonym: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Create an identity for a caller who proves the external id.
///
/// An existing external id → `AlreadyRegistered`; a credential that does not
/// verify for the claimed id → `RegistrationRejected`. Both are checked before
/// anything is written.
pub async fn register(
    store: &dyn IdentityStore,
    verifier: &dyn CredentialVerifier,
    req: RegisterRequest,
) -> Result<Identity, AppError> {
    let external_id = String::from(req.vk_id).trim().to_string();
    if external_id.is_empty() {
        return Err(AppError::InvalidRequest("vk_id must not be empty".into()));
    }

    if store.find_by_external_id(&external_id).await?.is_some() {
        tracing::info!(external_id = %external_id, "registration refused: already registered");
        return Err(AppError::AlreadyRegistered);
    }

    let candidate = Identity::new(0, external_id.clone());
    if !verifier.verify(&candidate, &req.url) {
        tracing::warn!(external_id = %external_id, "registration refused: credential check failed");
        return Err(AppError::RegistrationRejected);
    }

    let identity = store
        .create(&NewIdentity {
            external_id,
            full_name: Some(req.full_name),
            pseudonym: req.pseudonym,
            bio: req.bio,
            avatar_url: req.avatar_url,
        })
        .await?;

    tracing::info!(external_id = %identity.external_id, id = identity.id, "identity registered");
    Ok(identity)
}
