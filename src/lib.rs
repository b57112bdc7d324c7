//! ReadRoom API — login and bearer-token issuance.
//!
//! The binary in `main.rs` wires these modules to PostgreSQL; tests in
//! `tests/` drive the same router against the in-memory store.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod store;

use std::sync::Arc;

use auth::token::TokenIssuer;
use auth::CredentialVerifier;
use store::IdentityStore;

/// Shared application state passed to handlers and extractors.
pub struct AppState {
    pub store: Arc<dyn IdentityStore>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub issuer: TokenIssuer,
    pub config: config::Config,
}

impl AppState {
    pub fn new(
        config: config::Config,
        store: Arc<dyn IdentityStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> anyhow::Result<Self> {
        let issuer = TokenIssuer::new(&config.token)?;
        Ok(Self {
            store,
            verifier,
            issuer,
            config,
        })
    }
}
