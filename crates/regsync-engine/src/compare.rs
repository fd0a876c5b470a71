//! Comparison driver
//!
//! Declarative field-level diffing between an authoritative record and
//! a source-of-truth record. Each field is described once, by a triple
//! of (extract authoritative, extract source, build update); the
//! driver is a dumb loop over the declared triples.
//!
//! Absence of a value on *either* side silently skips that single
//! comparison - incomplete data must never turn into an update to
//! blank. This trades recall for safety, deliberately.

use tracing::debug;

use crate::update::UpdateFragment;

/// A field value coerced to a directly comparable primitive.
///
/// Coercion (case folding, trimming) belongs inside the extractors;
/// the driver only ever performs strict equality on these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
}

impl FieldValue {
    /// Falsy values ("" and 0) signal "no actionable change" even when
    /// the sides differ; builders return nothing for them.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int(i) => *i == 0,
        }
    }

    /// String form for embedding in update payloads.
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

type Extractor<R> = Box<dyn Fn(&R) -> Option<FieldValue> + Send + Sync>;
type UpdateBuilder = Box<dyn Fn(&FieldValue) -> Option<UpdateFragment> + Send + Sync>;

/// One declared field comparison: how to read both sides and how to
/// turn a changed source value into an update fragment.
pub struct FieldComparison<A, S> {
    name: &'static str,
    extract_authoritative: Extractor<A>,
    extract_source: Extractor<S>,
    build_update: UpdateBuilder,
}

impl<A, S> FieldComparison<A, S> {
    /// Declare a comparison.
    ///
    /// `build` must return `None` for falsy new values; use
    /// [`guarded`] to get that behavior for free.
    pub fn new(
        name: &'static str,
        extract_authoritative: impl Fn(&A) -> Option<FieldValue> + Send + Sync + 'static,
        extract_source: impl Fn(&S) -> Option<FieldValue> + Send + Sync + 'static,
        build_update: impl Fn(&FieldValue) -> Option<UpdateFragment> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            extract_authoritative: Box::new(extract_authoritative),
            extract_source: Box::new(extract_source),
            build_update: Box::new(build_update),
        }
    }

    /// The declared field name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Wrap an update builder with the falsy-value guard: a falsy new
/// value yields no fragment, whatever the builder would do.
pub fn guarded(
    build: impl Fn(&FieldValue) -> UpdateFragment + Send + Sync + 'static,
) -> impl Fn(&FieldValue) -> Option<UpdateFragment> + Send + Sync + 'static {
    move |value| {
        if value.is_falsy() {
            None
        } else {
            Some(build(value))
        }
    }
}

/// Drives a declared list of field comparisons over a record pair.
pub struct Comparator<A, S> {
    comparisons: Vec<FieldComparison<A, S>>,
}

impl<A, S> Comparator<A, S> {
    /// Create a comparator over the declared triples. Order controls
    /// evaluation order only; fields do not interact.
    #[must_use]
    pub fn new(comparisons: Vec<FieldComparison<A, S>>) -> Self {
        Self { comparisons }
    }

    /// Compute the update fragments needed to bring the authoritative
    /// record in line with the source record.
    pub fn compare(&self, authoritative: &A, source: &S) -> Vec<UpdateFragment> {
        let mut updates = Vec::new();

        for comparison in &self.comparisons {
            let auth_value = (comparison.extract_authoritative)(authoritative);
            let source_value = (comparison.extract_source)(source);

            let (Some(auth_value), Some(source_value)) = (auth_value, source_value) else {
                // Cannot compare; skip this field, not the record.
                continue;
            };

            if auth_value == source_value {
                continue;
            }

            if let Some(fragment) = (comparison.build_update)(&source_value) {
                debug!(
                    field = comparison.name,
                    section = %fragment.section,
                    key = %fragment.key,
                    "field changed"
                );
                updates.push(fragment);
            }
        }

        updates
    }
}
