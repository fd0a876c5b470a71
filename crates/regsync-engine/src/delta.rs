//! Snapshot delta importer
//!
//! The legacy relational source is read as a frozen snapshot per run;
//! the work list for the importer is the delta between this run's
//! snapshot and the previous run's persisted one. Row identity is a
//! SHA256 fingerprint over canonical JSON (sorted keys, no
//! whitespace), so attribute ordering differences never count as
//! changes.

use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use regsync_connector::{Snapshot, SnapshotStore, SyncResult};

/// The per-run work list: natural keys bucketed by what happened to
/// them since the previous run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeltaSet {
    /// Keys present now but not in the previous snapshot.
    pub created: Vec<String>,

    /// Keys present in both whose row content changed.
    pub changed: Vec<String>,

    /// Keys present in the previous snapshot but gone now.
    pub removed: Vec<String>,
}

impl DeltaSet {
    /// True when nothing changed between the runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    /// Total number of affected keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.len() + self.changed.len() + self.removed.len()
    }
}

/// Compute the delta between two snapshots.
///
/// Output vectors follow the snapshots' key order, which is stable.
#[must_use]
pub fn compute_delta(previous: &Snapshot, current: &Snapshot) -> DeltaSet {
    let mut delta = DeltaSet::default();

    for (key, row) in &current.rows {
        match previous.rows.get(key) {
            None => delta.created.push(key.clone()),
            Some(previous_row) => {
                if row_fingerprint(previous_row) != row_fingerprint(row) {
                    delta.changed.push(key.clone());
                }
            }
        }
    }

    for key in previous.rows.keys() {
        if !current.rows.contains_key(key) {
            delta.removed.push(key.clone());
        }
    }

    delta
}

/// SHA256 hex fingerprint of a row's canonical JSON.
#[must_use]
pub fn row_fingerprint(row: &serde_json::Value) -> String {
    let canonical = sort_json_keys(row);
    let serialized = serde_json::to_string(&canonical).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recursively sort JSON object keys for canonical representation.
fn sort_json_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_json_keys(v)))
                .collect();
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sort_json_keys).collect())
        }
        other => other.clone(),
    }
}

/// Ties snapshot persistence to delta computation for one source.
pub struct DeltaImporter<S> {
    store: S,
    source: String,
}

impl<S: SnapshotStore> DeltaImporter<S> {
    /// Create an importer for one named legacy source.
    pub fn new(store: S, source: impl Into<String>) -> Self {
        Self {
            store,
            source: source.into(),
        }
    }

    /// Delta of the current frozen read against the previous run's
    /// persisted snapshot. A missing previous snapshot means a first
    /// run: every row is `created`.
    #[instrument(skip(self, current), fields(source = %self.source))]
    pub async fn delta_against_previous(&self, current: &Snapshot) -> SyncResult<DeltaSet> {
        let previous = self
            .store
            .load(&self.source)
            .await?
            .unwrap_or_else(Snapshot::empty);

        let delta = compute_delta(&previous, current);
        info!(
            created = delta.created.len(),
            changed = delta.changed.len(),
            removed = delta.removed.len(),
            "computed snapshot delta"
        );
        Ok(delta)
    }

    /// Persist this run's snapshot as the baseline for the next run.
    /// Call only after the batch has been processed.
    pub async fn commit(&self, current: &Snapshot) -> SyncResult<()> {
        self.store.save(&self.source, current).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn snapshot(rows: Vec<(&str, serde_json::Value)>) -> Snapshot {
        Snapshot::from_rows(
            rows.into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_unchanged_rows_in_no_bucket() {
        let previous = snapshot(vec![("1", json!({"name": "A", "meter": 7}))]);
        let current = snapshot(vec![("1", json!({"name": "A", "meter": 7}))]);

        let delta = compute_delta(&previous, &current);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_key_order_does_not_count_as_change() {
        let previous = snapshot(vec![("1", json!({"name": "A", "meter": 7}))]);
        let current = snapshot(vec![("1", json!({"meter": 7, "name": "A"}))]);

        let delta = compute_delta(&previous, &current);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_buckets_are_disjoint_and_complete() {
        let previous = snapshot(vec![
            ("kept", json!({"v": 1})),
            ("mutated", json!({"v": 1})),
            ("vanished", json!({"v": 1})),
        ]);
        let current = snapshot(vec![
            ("kept", json!({"v": 1})),
            ("mutated", json!({"v": 2})),
            ("new", json!({"v": 1})),
        ]);

        let delta = compute_delta(&previous, &current);
        assert_eq!(delta.created, vec!["new"]);
        assert_eq!(delta.changed, vec!["mutated"]);
        assert_eq!(delta.removed, vec!["vanished"]);
        assert_eq!(delta.len(), 3);
    }

    #[test]
    fn test_nested_change_detected() {
        let previous = snapshot(vec![("1", json!({"address": {"street": "A", "no": "1"}}))]);
        let current = snapshot(vec![("1", json!({"address": {"street": "B", "no": "1"}}))]);

        let delta = compute_delta(&previous, &current);
        assert_eq!(delta.changed, vec!["1"]);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = row_fingerprint(&json!({"x": [1, 2, {"b": 1, "a": 2}]}));
        let b = row_fingerprint(&json!({"x": [1, 2, {"a": 2, "b": 1}]}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    mod importer {
        use super::*;
        use async_trait::async_trait;
        use regsync_connector::SnapshotStore;
        use std::sync::Mutex;

        #[derive(Default)]
        struct MemorySnapshotStore {
            saved: Mutex<Option<Snapshot>>,
        }

        #[async_trait]
        impl SnapshotStore for MemorySnapshotStore {
            async fn load(&self, _source: &str) -> regsync_connector::SyncResult<Option<Snapshot>> {
                Ok(self.saved.lock().unwrap().clone())
            }

            async fn save(
                &self,
                _source: &str,
                snapshot: &Snapshot,
            ) -> regsync_connector::SyncResult<()> {
                *self.saved.lock().unwrap() = Some(snapshot.clone());
                Ok(())
            }
        }

        #[tokio::test]
        async fn test_first_run_is_all_created() {
            let importer = DeltaImporter::new(MemorySnapshotStore::default(), "kmdee");
            let current = snapshot(vec![("1", json!({"v": 1})), ("2", json!({"v": 2}))]);

            let delta = importer.delta_against_previous(&current).await.unwrap();
            assert_eq!(delta.created.len(), 2);
            assert!(delta.changed.is_empty());
            assert!(delta.removed.is_empty());
        }

        #[tokio::test]
        async fn test_commit_then_rerun_is_empty_delta() {
            let importer = DeltaImporter::new(MemorySnapshotStore::default(), "kmdee");
            let current = snapshot(vec![("1", json!({"v": 1}))]);

            importer.commit(&current).await.unwrap();
            let delta = importer.delta_against_previous(&current).await.unwrap();
            assert!(delta.is_empty());
        }
    }
}
