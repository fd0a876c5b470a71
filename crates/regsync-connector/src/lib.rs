//! # regsync connector contracts
//!
//! Narrow contracts for every external collaborator of the
//! synchronization agents, plus the shared error taxonomy and the
//! bounded retry executor:
//!
//! - [`RegistryStore`] - the authoritative LoRa/OIO object store
//! - [`PersonRegistry`] / [`CompanyRegistry`] - national CPR/CVR services
//! - [`AddressService`] - structured/fuzzy address resolution
//! - [`CrmStore`] + [`GuardedCrm`] - downstream CRM with write gating
//! - [`ErrorReporter`] - fire-and-forget operator side channel
//! - [`SnapshotStore`] - persisted legacy-source snapshots
//!
//! The protocol plumbing behind these traits (SOAP envelopes, REST
//! shapes, SQL text) lives with the deployments; agents and tests only
//! ever see these interfaces.

pub mod address;
pub mod civil;
pub mod crm;
pub mod error;
pub mod registry;
pub mod reporting;
pub mod resilience;
pub mod snapshot;

pub use address::{resolve_address, AddressService, StructuredAddress};
pub use civil::{CompanyRegistry, CprPerson, CvrCompany, PersonRegistry};
pub use crm::{CrmStore, GuardedCrm, WriteMode};
pub use error::{SyncError, SyncResult};
pub use registry::RegistryStore;
pub use reporting::{ErrorReport, ErrorReporter, LogReporter};
pub use resilience::{RetryConfig, RetryExecutor};
pub use snapshot::{Snapshot, SnapshotStore};
