//! Authoritative registry store contract
//!
//! The LoRa/OIO-modeled object store that is the system of record.
//! Lookups by natural key return `None` when nothing matches - that is
//! the normal branch that causes creation, never an error.

use async_trait::async_trait;

use regsync_core::{EntityKind, RegistryId};

use crate::error::SyncResult;

/// The authoritative object store.
///
/// Records are mutated via full-payload PUT/PATCH semantics; no
/// partial server-side merge is assumed.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Find an existing record by its natural key (CPR/CVR number,
    /// customer number). `None` means "not found", a normal state.
    async fn lookup(
        &self,
        kind: EntityKind,
        natural_key: &str,
    ) -> SyncResult<Option<RegistryId>>;

    /// Create a record and return the identifier assigned by the store.
    async fn create(
        &self,
        kind: EntityKind,
        payload: &serde_json::Value,
    ) -> SyncResult<RegistryId>;

    /// Replace a record's payload.
    async fn update(
        &self,
        kind: EntityKind,
        id: RegistryId,
        payload: &serde_json::Value,
    ) -> SyncResult<()>;
}
