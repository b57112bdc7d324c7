use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, Json};

use crate::auth::extract::CurrentUser;
use crate::auth::login::{authenticate, LoginRequest};
use crate::auth::register::{register, RegisterRequest};
use crate::auth::token::TokenResponse;
use crate::errors::AppError;
use crate::models::identity::{IdentityProfile, ProfileUpdate};
use crate::AppState;

/// POST /token — exchange a login form for a bearer token
pub async fn login_for_access_token(
    State(state): State<Arc<AppState>>,
    login: LoginRequest,
) -> Result<Json<TokenResponse>, AppError> {
    let identity = authenticate(
        state.store.as_ref(),
        state.verifier.as_ref(),
        &login.external_id,
        &login.credential,
    )
    .await?;

    let issued = state.issuer.issue(&identity.external_id)?;
    tracing::info!(
        external_id = %identity.external_id,
        expires_at = %issued.expires_at,
        "access token issued"
    );

    Ok(Json(TokenResponse::from(issued)))
}

/// GET /users/me — profile of the token's owner
pub async fn read_users_me(CurrentUser(identity): CurrentUser) -> Json<IdentityProfile> {
    Json(IdentityProfile::from(identity))
}

/// POST /users/register — create an identity and log it straight in
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let identity = register(state.store.as_ref(), state.verifier.as_ref(), req).await?;

    let issued = state.issuer.issue(&identity.external_id)?;
    Ok(Json(TokenResponse::from(issued)))
}

/// PUT /users/me — change profile fields of the token's owner
pub async fn update_users_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<IdentityProfile>, AppError> {
    let Json(update) = body.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let updated = state
        .store
        .update_profile(&identity.external_id, &update)
        .await?
        .ok_or(AppError::UserNotFound)?;

    tracing::info!(external_id = %updated.external_id, "profile updated");
    Ok(Json(IdentityProfile::from(updated)))
}

/// GET /readyz — 200 when the identity store answers, 503 otherwise
pub async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
