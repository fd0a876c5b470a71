//! Durable identifier cache
//!
//! Postgres-backed implementation of [`IdentifierCache`]. The unique
//! constraint on `(kind, source_key)` is what turns `put_if_absent`
//! into a real compare-and-swap across processes: restarts and
//! concurrent workers cannot cause duplicate downstream creation.
//!
//! Expected table:
//!
//! ```sql
//! CREATE TABLE sync_identifier_cache (
//!     kind         TEXT        NOT NULL,
//!     source_key   TEXT        NOT NULL,
//!     registry_id  UUID,
//!     external_ref TEXT,
//!     created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (kind, source_key)
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use regsync_core::{EntityKind, ExternalRef, RegistryId};
use regsync_connector::{SyncError, SyncResult};

use crate::cache::IdentifierCache;

/// Postgres-backed identifier cache.
pub struct PgIdentifierCache {
    pool: PgPool,
}

impl PgIdentifierCache {
    /// Create a cache over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentifierCache for PgIdentifierCache {
    async fn get(&self, kind: EntityKind, source_key: &str) -> SyncResult<Option<RegistryId>> {
        let row = sqlx::query(
            r"
            SELECT registry_id
            FROM sync_identifier_cache
            WHERE kind = $1 AND source_key = $2
            ",
        )
        .bind(kind.as_str())
        .bind(source_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("cache get failed", e))?;

        Ok(row
            .and_then(|r| r.get::<Option<Uuid>, _>("registry_id"))
            .map(RegistryId::from_uuid))
    }

    async fn put(&self, kind: EntityKind, source_key: &str, id: RegistryId) -> SyncResult<()> {
        sqlx::query(
            r"
            INSERT INTO sync_identifier_cache (kind, source_key, registry_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (kind, source_key) DO UPDATE SET
                registry_id = EXCLUDED.registry_id,
                updated_at = NOW()
            ",
        )
        .bind(kind.as_str())
        .bind(source_key)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("cache put failed", e))?;

        Ok(())
    }

    async fn put_if_absent(
        &self,
        kind: EntityKind,
        source_key: &str,
        id: RegistryId,
    ) -> SyncResult<RegistryId> {
        // COALESCE keeps an already-stored id; the unique constraint
        // makes this a single-winner operation under contention.
        let row = sqlx::query(
            r"
            INSERT INTO sync_identifier_cache (kind, source_key, registry_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (kind, source_key) DO UPDATE SET
                registry_id = COALESCE(sync_identifier_cache.registry_id, EXCLUDED.registry_id),
                updated_at = NOW()
            RETURNING registry_id
            ",
        )
        .bind(kind.as_str())
        .bind(source_key)
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("cache put_if_absent failed", e))?;

        let winner: Option<Uuid> = row.get("registry_id");
        Ok(winner.map(RegistryId::from_uuid).unwrap_or(id))
    }

    async fn get_external_ref(
        &self,
        kind: EntityKind,
        source_key: &str,
    ) -> SyncResult<Option<ExternalRef>> {
        let row = sqlx::query(
            r"
            SELECT external_ref
            FROM sync_identifier_cache
            WHERE kind = $1 AND source_key = $2
            ",
        )
        .bind(kind.as_str())
        .bind(source_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("cache get_external_ref failed", e))?;

        Ok(row
            .and_then(|r| r.get::<Option<String>, _>("external_ref"))
            .map(ExternalRef::new))
    }

    async fn set_external_ref(
        &self,
        kind: EntityKind,
        source_key: &str,
        external_ref: &ExternalRef,
    ) -> SyncResult<()> {
        sqlx::query(
            r"
            INSERT INTO sync_identifier_cache (kind, source_key, external_ref)
            VALUES ($1, $2, $3)
            ON CONFLICT (kind, source_key) DO UPDATE SET
                external_ref = EXCLUDED.external_ref,
                updated_at = NOW()
            ",
        )
        .bind(kind.as_str())
        .bind(source_key)
        .bind(external_ref.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("cache set_external_ref failed", e))?;

        Ok(())
    }

    async fn purge(&self, kind: EntityKind) -> SyncResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM sync_identifier_cache WHERE kind = $1
            ",
        )
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::database_with_source("cache purge failed", e))?;

        Ok(result.rows_affected())
    }
}
