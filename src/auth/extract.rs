use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::models::identity::Identity;
use crate::AppState;

/// The identity behind a valid `Authorization: Bearer <jwt>` header.
///
/// Rejections: missing header → 401, bad or expired token → 401,
/// unknown subject → 401, inactive identity → 403.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::NotAuthenticated)?;
        let claims = state.issuer.decode(token)?;

        let identity = state
            .store
            .find_by_external_id(&claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::warn!(external_id = %claims.sub, "token subject no longer exists");
                AppError::UserNotFound
            })?;

        if !identity.is_active {
            return Err(AppError::InactiveUser);
        }

        Ok(CurrentUser(identity))
    }
}

/// Extract the token from an `Authorization: Bearer ...` header.
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
