//! National person/company registry contracts
//!
//! The CPR and CVR data services used to populate or validate
//! authoritative records. Both fail with `NotFound` when the subject
//! does not exist; callers go through the retry executor because the
//! real services rate-limit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use regsync_core::{Cpr, Cvr};

use crate::address::StructuredAddress;
use crate::error::SyncResult;

/// Person data as served by the national person registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CprPerson {
    pub cpr: Cpr,

    pub first_name: String,

    pub last_name: String,

    /// Registered residence, absent for protected addresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<StructuredAddress>,

    /// Name/address protection marker; protected subjects must not be
    /// exported to downstream systems.
    #[serde(default)]
    pub protected: bool,
}

impl CprPerson {
    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Company data as served by the national company registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvrCompany {
    pub cvr: Cvr,

    pub name: String,

    /// Legal company form code (e.g. "80" for ApS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_form: Option<String>,

    /// Industry code from the business register.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<StructuredAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The national person registry.
#[async_trait]
pub trait PersonRegistry: Send + Sync {
    /// Fetch person data. Fails with `NotFound` for unknown numbers.
    async fn get_person(&self, cpr: &Cpr) -> SyncResult<CprPerson>;
}

/// The national company registry.
#[async_trait]
pub trait CompanyRegistry: Send + Sync {
    /// Fetch company data. Fails with `NotFound` for unknown numbers.
    async fn get_company(&self, cvr: &Cvr) -> SyncResult<CvrCompany>;
}
