//! Legacy source snapshots
//!
//! The legacy relational source is read-only and treated as a frozen
//! snapshot per run; each run's delta is computed against the previous
//! run's persisted snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SyncResult;

/// A frozen read of a legacy source: rows keyed by natural key.
///
/// BTreeMap keeps iteration (and therefore delta reports) in a stable
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,

    pub rows: BTreeMap<String, serde_json::Value>,
}

impl Snapshot {
    /// An empty snapshot taken now.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            taken_at: Utc::now(),
            rows: BTreeMap::new(),
        }
    }

    /// A snapshot over the given rows, taken now.
    #[must_use]
    pub fn from_rows(rows: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            taken_at: Utc::now(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Persistence for per-source snapshots between runs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the previous run's snapshot for a source, if any.
    async fn load(&self, source: &str) -> SyncResult<Option<Snapshot>>;

    /// Persist this run's snapshot for a source.
    async fn save(&self, source: &str, snapshot: &Snapshot) -> SyncResult<()>;
}
