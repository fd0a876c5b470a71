//! # regsync engine
//!
//! The reconciliation and dependency-ordered upsert engine shared by
//! the synchronization agents.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌─────────────────┐
//! │ Legacy/CVR   │────►│  Batch Runner │────►│ Upsert Pipeline │
//! │ source rows  │     │ (isolation)   │     │ (chain order)   │
//! └──────────────┘     └──────┬────────┘     └────────┬────────┘
//!                             │                       │
//!                             ▼                       ▼
//!                      ┌─────────────┐        ┌───────────────┐
//!                      │   Error     │        │  Identifier   │
//!                      │  Reporter   │        │    Cache      │
//!                      └─────────────┘        └───────────────┘
//!
//! ┌──────────────┐     ┌───────────────┐     ┌─────────────────┐
//! │ Authoritative│────►│  Comparator   │────►│ Update document │
//! │ + source rec │     │ (triples)     │     │ (full payload)  │
//! └──────────────┘     └───────────────┘     └─────────────────┘
//! ```
//!
//! - [`compare`] - declarative field-level diffing over extractor/
//!   comparator/update-builder triples
//! - [`update`] - update fragments with validity windows, assembled
//!   into full-payload documents
//! - [`cache`] / [`cache_pg`] - the identifier cache preventing
//!   duplicate downstream creation (in-memory and durable Postgres)
//! - [`chain`] / [`upsert`] - dependency chains as data, executed by
//!   the lookup-or-create pipeline
//! - [`batch`] - per-row failure isolation and the bounded parallel
//!   phase
//! - [`delta`] - snapshot deltas against the previous run of a legacy
//!   source
//! - [`refresh`] - the notification-driven fetch/compare/update flow
//!   for organisations

pub mod batch;
pub mod cache;
pub mod cache_pg;
pub mod chain;
pub mod compare;
pub mod delta;
pub mod fields;
pub mod refresh;
pub mod snapshot_pg;
pub mod update;
pub mod upsert;

pub use batch::{BatchConfig, BatchReport, BatchRunner, RowFailure};
pub use cache::{CacheEntry, IdentifierCache, MemoryIdentifierCache};
pub use cache_pg::PgIdentifierCache;
pub use chain::{ChainError, Dependency, DependencyChain, NodeSpec};
pub use compare::{guarded, Comparator, FieldComparison, FieldValue};
pub use delta::{compute_delta, row_fingerprint, DeltaImporter, DeltaSet};
pub use fields::organisation_comparator;
pub use refresh::OrganisationRefresher;
pub use snapshot_pg::PgSnapshotStore;
pub use update::{assemble_document, UpdateFragment};
pub use upsert::{
    ref_to, ChainNode, ChainOutcome, ChainPlan, NodeResolution, NodeState, UpsertPipeline,
};
