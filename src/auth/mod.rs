//! Login credential checks and bearer-token handling.
//!
//! Flow for `POST /token`:
//! 1. `login::authenticate` resolves the identity by external id (one lookup)
//! 2. a `CredentialVerifier` decides whether the presented value proves it
//! 3. `token::TokenIssuer` signs a JWT with `sub` = external id and a fixed lifetime
//!
//! Subsequent requests present the JWT and are resolved by `extract::CurrentUser`.
//! New accounts come from `register::register`, which checks the same
//! credential before creating the identity.

pub mod extract;
pub mod login;
pub mod register;
pub mod token;
pub mod vk;

use crate::models::identity::Identity;

/// Token type reported alongside every issued access token.
pub const TOKEN_TYPE: &str = "bearer";

/// Decides whether a presented credential value proves ownership of an identity.
/// Implementations: VkLaunchVerifier (VK Mini App launch-parameter signatures).
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, identity: &Identity, presented: &str) -> bool;
}
