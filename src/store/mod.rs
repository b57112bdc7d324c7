pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::identity::{Identity, NewIdentity, ProfileUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("external id already registered")]
    DuplicateExternalId,

    #[error("pseudonym already taken")]
    DuplicatePseudonym,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Access to identity records.
/// Implementations: PgStore (PostgreSQL), MemoryStore (in-process map).
///
/// Login only ever calls `find_by_external_id`; writes come from
/// registration and profile edits.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by the external platform's user id.
    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Identity>>;

    /// Insert a new active identity with the default role.
    async fn create(&self, new: &NewIdentity) -> Result<Identity, StoreError>;

    /// Apply the fields present in `update`. `None` when no identity has
    /// that external id.
    async fn update_profile(
        &self,
        external_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Identity>, StoreError>;

    /// Cheap connectivity check behind `GET /readyz`.
    async fn ping(&self) -> anyhow::Result<()>;
}
