//! # regsync core types
//!
//! Shared vocabulary for the synchronization agents:
//!
//! - Type-safe identifiers ([`RegistryId`], [`ExternalRef`])
//! - Entity kinds handled by the pipelines ([`EntityKind`])
//! - Validated natural keys ([`Cpr`], [`Cvr`])
//! - Bi-temporal validity windows ([`Virkning`])
//! - Typed registry record schemas ([`RegistryRecord`])
//!
//! Records are tagged schemas with explicit optional fields: payloads
//! are validated when they enter the system, so the engine never deals
//! with structurally unknown data.

pub mod entity;
pub mod ids;
pub mod keys;
pub mod record;
pub mod virkning;

pub use entity::EntityKind;
pub use ids::{ExternalRef, RegistryId};
pub use keys::{Cpr, Cvr, KeyError};
pub use record::{
    OrganisationAttributes, OrganisationProperties, OrganisationRecord, OrganisationRelations,
    OrganisationStates, PersonAttributes, PersonProperties, PersonRecord, PersonRelations,
    PersonStates, RegistryRecord, RelationRef, ValidityState, CPR_URN_PREFIX, CVR_URN_PREFIX,
};
pub use virkning::{Virkning, INFINITY};
