//! Identifier cache
//!
//! The single source of truth for "has this entity already been
//! created downstream". Maps a `(kind, source key)` pair to the
//! identifier assigned by the authoritative store and, once obtained,
//! the reference assigned by the downstream system.
//!
//! The cache is injected, never a module-level global, so pipelines
//! and tests run in isolation. Production runs use the durable
//! Postgres implementation; process restarts must not cause duplicate
//! downstream creation.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use regsync_core::{EntityKind, ExternalRef, RegistryId};
use regsync_connector::SyncResult;

/// One cached mapping for a source-system entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheEntry {
    /// Identifier in the authoritative store, once known.
    pub registry_id: Option<RegistryId>,

    /// Reference assigned by the downstream system, once created
    /// there. Never changes after it is first set.
    pub external_ref: Option<ExternalRef>,
}

/// Identifier cache contract.
///
/// `get`/`put` are last-writer-wins; `put_if_absent` provides the
/// compare-and-swap needed by the concurrent create phase, so two
/// workers resolving the same source key observe a single winning
/// identifier.
#[async_trait]
pub trait IdentifierCache: Send + Sync {
    /// Look up the authoritative identifier for a source key.
    async fn get(&self, kind: EntityKind, source_key: &str) -> SyncResult<Option<RegistryId>>;

    /// Record the authoritative identifier for a source key.
    async fn put(&self, kind: EntityKind, source_key: &str, id: RegistryId) -> SyncResult<()>;

    /// Record the identifier only if none is present yet; returns the
    /// identifier that ended up stored (the winner under contention).
    async fn put_if_absent(
        &self,
        kind: EntityKind,
        source_key: &str,
        id: RegistryId,
    ) -> SyncResult<RegistryId>;

    /// Look up the downstream reference for a source key.
    async fn get_external_ref(
        &self,
        kind: EntityKind,
        source_key: &str,
    ) -> SyncResult<Option<ExternalRef>>;

    /// Record a newly obtained downstream reference.
    async fn set_external_ref(
        &self,
        kind: EntityKind,
        source_key: &str,
        external_ref: &ExternalRef,
    ) -> SyncResult<()>;

    /// Explicit purge pass for one kind; returns how many entries were
    /// dropped. Entries are never deleted implicitly.
    async fn purge(&self, kind: EntityKind) -> SyncResult<u64>;
}

/// In-memory cache for tests and single-shot runs.
#[derive(Debug, Default)]
pub struct MemoryIdentifierCache {
    entries: RwLock<HashMap<(EntityKind, String), CacheEntry>>,
}

impl MemoryIdentifierCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl IdentifierCache for MemoryIdentifierCache {
    async fn get(&self, kind: EntityKind, source_key: &str) -> SyncResult<Option<RegistryId>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(kind, source_key.to_string()))
            .and_then(|e| e.registry_id))
    }

    async fn put(&self, kind: EntityKind, source_key: &str, id: RegistryId) -> SyncResult<()> {
        let mut entries = self.entries.write().await;
        entries
            .entry((kind, source_key.to_string()))
            .or_default()
            .registry_id = Some(id);
        Ok(())
    }

    async fn put_if_absent(
        &self,
        kind: EntityKind,
        source_key: &str,
        id: RegistryId,
    ) -> SyncResult<RegistryId> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry((kind, source_key.to_string())).or_default();
        match entry.registry_id {
            Some(existing) => Ok(existing),
            None => {
                entry.registry_id = Some(id);
                Ok(id)
            }
        }
    }

    async fn get_external_ref(
        &self,
        kind: EntityKind,
        source_key: &str,
    ) -> SyncResult<Option<ExternalRef>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(kind, source_key.to_string()))
            .and_then(|e| e.external_ref.clone()))
    }

    async fn set_external_ref(
        &self,
        kind: EntityKind,
        source_key: &str,
        external_ref: &ExternalRef,
    ) -> SyncResult<()> {
        let mut entries = self.entries.write().await;
        entries
            .entry((kind, source_key.to_string()))
            .or_default()
            .external_ref = Some(external_ref.clone());
        Ok(())
    }

    async fn purge(&self, kind: EntityKind) -> SyncResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(k, _), _| *k != kind);
        Ok((before - entries.len()) as u64)
    }
}
