use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{IdentityStore, StoreError};
use crate::models::identity::{Identity, NewIdentity, ProfileUpdate};

/// In-process identity store. Backs the HTTP tests; no persistence.
///
/// Pseudonym uniqueness is checked before the write, not atomically with it.
#[derive(Default)]
pub struct MemoryStore {
    identities: DashMap<String, Identity>,
    last_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the identity keyed by its external id.
    pub fn insert(&self, identity: Identity) {
        self.last_id.fetch_max(identity.id, Ordering::SeqCst);
        self.identities
            .insert(identity.external_id.clone(), identity);
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Must not be called while holding a shard lock: it iterates every shard.
    fn pseudonym_taken(&self, pseudonym: Option<&str>, except_external_id: &str) -> bool {
        let Some(pseudonym) = pseudonym else {
            return false;
        };
        self.identities.iter().any(|entry| {
            entry.key() != except_external_id && entry.pseudonym.as_deref() == Some(pseudonym)
        })
    }
}

impl FromIterator<Identity> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        let store = Self::new();
        for identity in iter {
            store.insert(identity);
        }
        store
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Identity>> {
        Ok(self.identities.get(external_id).map(|entry| entry.clone()))
    }

    async fn create(&self, new: &NewIdentity) -> Result<Identity, StoreError> {
        if self.pseudonym_taken(new.pseudonym.as_deref(), &new.external_id) {
            return Err(StoreError::DuplicatePseudonym);
        }

        match self.identities.entry(new.external_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateExternalId),
            Entry::Vacant(slot) => {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                let mut identity = Identity::new(id, new.external_id.clone());
                identity.full_name = new.full_name.clone();
                identity.pseudonym = new.pseudonym.clone();
                identity.bio = new.bio.clone();
                identity.avatar_url = new.avatar_url.clone();
                slot.insert(identity.clone());
                Ok(identity)
            }
        }
    }

    async fn update_profile(
        &self,
        external_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        if self.pseudonym_taken(update.pseudonym.as_deref(), external_id) {
            return Err(StoreError::DuplicatePseudonym);
        }

        Ok(self.identities.get_mut(external_id).map(|mut entry| {
            update.apply_to(&mut entry);
            entry.clone()
        }))
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
