//! Durable snapshot store
//!
//! Postgres-backed implementation of [`SnapshotStore`], holding one
//! frozen legacy-source read per source name between runs.
//!
//! Expected table:
//!
//! ```sql
//! CREATE TABLE sync_snapshots (
//!     source    TEXT        PRIMARY KEY,
//!     taken_at  TIMESTAMPTZ NOT NULL,
//!     rows      JSONB       NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;

use regsync_connector::{Snapshot, SnapshotStore, SyncError, SyncResult};

/// Postgres-backed snapshot store.
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn load(&self, source: &str) -> SyncResult<Option<Snapshot>> {
        let row = sqlx::query(
            r"
            SELECT taken_at, rows
            FROM sync_snapshots
            WHERE source = $1
            ",
        )
        .bind(source)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("snapshot load failed", e))?;

        row.map(|r| {
            let taken_at: DateTime<Utc> = r.get("taken_at");
            let rows_value: serde_json::Value = r.get("rows");
            let rows: BTreeMap<String, serde_json::Value> = serde_json::from_value(rows_value)?;
            Ok(Snapshot { taken_at, rows })
        })
        .transpose()
    }

    async fn save(&self, source: &str, snapshot: &Snapshot) -> SyncResult<()> {
        let rows_value = serde_json::to_value(&snapshot.rows)?;

        sqlx::query(
            r"
            INSERT INTO sync_snapshots (source, taken_at, rows)
            VALUES ($1, $2, $3)
            ON CONFLICT (source) DO UPDATE SET
                taken_at = EXCLUDED.taken_at,
                rows = EXCLUDED.rows,
                updated_at = NOW()
            ",
        )
        .bind(source)
        .bind(snapshot.taken_at)
        .bind(&rows_value)
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("snapshot save failed", e))?;

        Ok(())
    }
}
