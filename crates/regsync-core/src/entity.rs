//! Entity kinds
//!
//! The object classes moved between the registry, the CRM and the
//! legacy sources. The dependency-chain roles are a subset of these.

use serde::{Deserialize, Serialize};

/// Kind of entity handled by the synchronization agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An organisation in the authoritative store (CVR-backed).
    Organisation,

    /// A person in the authoritative store (CPR-backed).
    Person,

    /// A resolved postal address.
    Address,

    /// A contact (person or company acting as customer contact).
    Contact,

    /// A customer account.
    Account,

    /// A customer role binding a contact to an account.
    CustomerRole,

    /// A supply/service agreement.
    Agreement,

    /// A product under an agreement.
    Product,
}

impl EntityKind {
    /// Stable string form, used as cache and table key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Organisation => "organisation",
            EntityKind::Person => "person",
            EntityKind::Address => "address",
            EntityKind::Contact => "contact",
            EntityKind::Account => "account",
            EntityKind::CustomerRole => "customer_role",
            EntityKind::Agreement => "agreement",
            EntityKind::Product => "product",
        }
    }

    /// All kinds, in no particular order.
    #[must_use]
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Organisation,
            EntityKind::Person,
            EntityKind::Address,
            EntityKind::Contact,
            EntityKind::Account,
            EntityKind::CustomerRole,
            EntityKind::Agreement,
            EntityKind::Product,
        ]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organisation" => Ok(EntityKind::Organisation),
            "person" => Ok(EntityKind::Person),
            "address" => Ok(EntityKind::Address),
            "contact" => Ok(EntityKind::Contact),
            "account" => Ok(EntityKind::Account),
            "customer_role" => Ok(EntityKind::CustomerRole),
            "agreement" => Ok(EntityKind::Agreement),
            "product" => Ok(EntityKind::Product),
            _ => Err(format!("Unknown entity kind: {s}")),
        }
    }
}
