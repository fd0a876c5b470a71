//! CRM object store contract and write gating
//!
//! The downstream CRM. Delete is destructive and gated behind an
//! explicit write-enable flag; the default-safe mode is a dry run in
//! which no write reaches the store at all.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use regsync_core::ExternalRef;

use crate::error::{SyncError, SyncResult};

/// The CRM object store.
#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Fetch an object; `None` when it does not exist.
    async fn get(&self, table: &str, id: &ExternalRef) -> SyncResult<Option<serde_json::Value>>;

    /// Create an object and return the CRM-assigned identifier.
    async fn create(&self, table: &str, payload: &serde_json::Value) -> SyncResult<ExternalRef>;

    /// Update an existing object.
    async fn update(
        &self,
        table: &str,
        id: &ExternalRef,
        payload: &serde_json::Value,
    ) -> SyncResult<()>;

    /// Delete an object. Destructive; callers must go through
    /// [`GuardedCrm`] so the write-enable flag is honored.
    async fn delete(&self, table: &str, id: &ExternalRef) -> SyncResult<()>;
}

/// Write mode for the guarded CRM wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Writes are logged and skipped; creates return synthetic refs.
    /// This is the default-safe mode.
    DryRun,

    /// Writes reach the store.
    Live,
}

impl Default for WriteMode {
    fn default() -> Self {
        WriteMode::DryRun
    }
}

/// Write-gating wrapper around a [`CrmStore`].
///
/// In dry-run mode every write becomes a logged no-op; creates return
/// a synthetic reference so pipelines can still wire entities together
/// while previewing a run. Delete additionally requires the
/// destructive-write flag even in live mode.
pub struct GuardedCrm<C> {
    inner: C,
    mode: WriteMode,
    allow_destructive: bool,
}

impl<C> GuardedCrm<C> {
    /// Wrap a store in the default-safe dry-run mode.
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            mode: WriteMode::DryRun,
            allow_destructive: false,
        }
    }

    /// Set the write mode.
    #[must_use]
    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable destructive writes (delete). Off by default.
    #[must_use]
    pub fn with_destructive_writes(mut self, allow: bool) -> Self {
        self.allow_destructive = allow;
        self
    }

    /// Check if the wrapper is in dry-run mode.
    pub fn is_dry_run(&self) -> bool {
        self.mode == WriteMode::DryRun
    }

    /// Get a reference to the inner store.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: CrmStore> CrmStore for GuardedCrm<C> {
    async fn get(&self, table: &str, id: &ExternalRef) -> SyncResult<Option<serde_json::Value>> {
        self.inner.get(table, id).await
    }

    async fn create(&self, table: &str, payload: &serde_json::Value) -> SyncResult<ExternalRef> {
        if self.is_dry_run() {
            let synthetic = ExternalRef::new(format!("dryrun-{}", Uuid::new_v4()));
            info!(table = table, r#ref = %synthetic, "dry run: skipping CRM create");
            return Ok(synthetic);
        }
        self.inner.create(table, payload).await
    }

    async fn update(
        &self,
        table: &str,
        id: &ExternalRef,
        payload: &serde_json::Value,
    ) -> SyncResult<()> {
        if self.is_dry_run() {
            info!(table = table, id = %id, "dry run: skipping CRM update");
            return Ok(());
        }
        self.inner.update(table, id, payload).await
    }

    async fn delete(&self, table: &str, id: &ExternalRef) -> SyncResult<()> {
        if !self.allow_destructive {
            return Err(SyncError::WriteDisabled {
                table: table.to_string(),
            });
        }
        if self.is_dry_run() {
            info!(table = table, id = %id, "dry run: skipping CRM delete");
            return Ok(());
        }
        self.inner.delete(table, id).await
    }
}
