//! Update fragments
//!
//! A fragment is one pending change to the authoritative record,
//! targeting a `(section, key)` pair and carrying a freshly generated
//! validity window. Fragments are assembled into a full-payload update
//! document, since the store offers no partial server-side merge.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use regsync_core::Virkning;

/// One pending change targeting a `(section, key)` of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFragment {
    /// Record section, e.g. `attributter`.
    pub section: String,

    /// Key within the section, e.g. `organisationegenskaber`.
    pub key: String,

    /// Replacement value carrying a `virkning` window.
    pub update: Value,
}

impl UpdateFragment {
    /// Build a fragment whose update holds the given fields plus a
    /// window starting today.
    #[must_use]
    pub fn new(
        section: impl Into<String>,
        key: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self::with_start_date(section, key, fields, chrono::Utc::now().date_naive())
    }

    /// Build a fragment with an explicit window start date.
    #[must_use]
    pub fn with_start_date(
        section: impl Into<String>,
        key: impl Into<String>,
        mut fields: Map<String, Value>,
        from: NaiveDate,
    ) -> Self {
        let virkning = Virkning::starting(from);
        fields.insert(
            "virkning".to_string(),
            serde_json::to_value(&virkning).unwrap_or(Value::Null),
        );
        Self {
            section: section.into(),
            key: key.into(),
            update: Value::Object(fields),
        }
    }

    /// Convenience for the common single-field fragment.
    #[must_use]
    pub fn single(
        section: impl Into<String>,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert(field.into(), value.into());
        Self::new(section, key, fields)
    }
}

/// Assemble fragments into one full-payload update document.
///
/// Shape: `{section: {key: [update]}}`. Fragments targeting disjoint
/// `(section, key)` pairs are order-independent; when two fragments in
/// one pass target the same pair, the last one wins and the collapse
/// is logged.
#[must_use]
pub fn assemble_document(fragments: &[UpdateFragment]) -> Value {
    let mut sections: Map<String, Value> = Map::new();

    for fragment in fragments {
        let section = sections
            .entry(fragment.section.clone())
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(keys) = section {
            if keys.contains_key(&fragment.key) {
                warn!(
                    section = %fragment.section,
                    key = %fragment.key,
                    "duplicate update target in one pass, last fragment wins"
                );
            }
            keys.insert(
                fragment.key.clone(),
                Value::Array(vec![fragment.update.clone()]),
            );
        }
    }

    Value::Object(sections)
}
