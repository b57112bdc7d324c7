use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use serde::Deserialize;

use super::CredentialVerifier;
use crate::errors::AppError;
use crate::models::identity::Identity;
use crate::store::IdentityStore;

/// A login attempt: the claimed external id and the credential value
/// presented to prove it.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub external_id: String,
    pub credential: String,
}

/// Standard OAuth2 password form; `password` carries the credential value.
#[derive(Deserialize)]
struct PasswordForm {
    username: String,
    password: String,
}

/// JSON body sent by the ReadRoom client.
#[derive(Deserialize)]
struct VkLoginBody {
    vk_id: ExternalId,
    url: String,
}

/// VK ids arrive as JSON numbers from the client, strings elsewhere.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        match id {
            ExternalId::Number(n) => n.to_string(),
            ExternalId::Text(s) => s,
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for LoginRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        let login = if is_json {
            let Json(body) = Json::<VkLoginBody>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
            LoginRequest {
                external_id: body.vk_id.into(),
                credential: body.url,
            }
        } else {
            let Form(form) = Form::<PasswordForm>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
            LoginRequest {
                external_id: form.username,
                credential: form.password,
            }
        };

        let external_id = login.external_id.trim().to_string();
        if external_id.is_empty() {
            return Err(AppError::InvalidRequest("username must not be empty".into()));
        }

        Ok(LoginRequest {
            external_id,
            credential: login.credential,
        })
    }
}

/// Resolve and check a login attempt.
///
/// Exactly one store lookup. Unknown identities and rejected credentials both
/// yield `AuthenticationFailed`; store failures propagate as internal errors.
/// The verifier runs on both branches so response time does not reveal
/// whether the external id exists.
pub async fn authenticate(
    store: &dyn IdentityStore,
    verifier: &dyn CredentialVerifier,
    external_id: &str,
    credential: &str,
) -> Result<Identity, AppError> {
    match store.find_by_external_id(external_id).await? {
        Some(identity) if verifier.verify(&identity, credential) => Ok(identity),
        Some(_) => {
            tracing::warn!(external_id = %external_id, "login rejected: credential check failed");
            Err(AppError::AuthenticationFailed)
        }
        None => {
            let placeholder = Identity::new(0, external_id);
            let _ = verifier.verify(&placeholder, credential);
            tracing::warn!(external_id = %external_id, "login rejected: unknown identity");
            Err(AppError::AuthenticationFailed)
        }
    }
}
