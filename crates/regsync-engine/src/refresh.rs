//! Organisation refresh
//!
//! The notification-driven comparator flow: fetch the company from the
//! national registry (through the bounded retry budget), diff it
//! against the authoritative organisation, and write the assembled
//! update document back - or nothing at all when no field actually
//! changed.

use std::sync::Arc;

use tracing::{info, instrument};

use regsync_core::{Cvr, EntityKind, OrganisationRecord};
use regsync_connector::{
    CompanyRegistry, CvrCompany, RegistryStore, RetryExecutor, SyncError, SyncResult,
};

use crate::compare::Comparator;
use crate::fields::organisation_comparator;
use crate::update::assemble_document;

/// Brings authoritative organisations in line with the company
/// registry.
pub struct OrganisationRefresher {
    store: Arc<dyn RegistryStore>,
    registry: Arc<dyn CompanyRegistry>,
    retry: RetryExecutor,
    comparator: Comparator<OrganisationRecord, CvrCompany>,
}

impl OrganisationRefresher {
    /// Create a refresher with the declared organisation comparisons.
    #[must_use]
    pub fn new(
        store: Arc<dyn RegistryStore>,
        registry: Arc<dyn CompanyRegistry>,
        retry: RetryExecutor,
    ) -> Self {
        Self {
            store,
            registry,
            retry,
            comparator: organisation_comparator(),
        }
    }

    /// Refresh one organisation. Returns the update document that was
    /// written, or `None` when the record was already in line.
    #[instrument(skip(self, organisation))]
    pub async fn refresh(
        &self,
        organisation: &OrganisationRecord,
    ) -> SyncResult<Option<serde_json::Value>> {
        let id = organisation.id.ok_or_else(|| {
            SyncError::validation("cannot refresh an organisation that has no registry id")
        })?;

        let digits = organisation.cvr_digits().ok_or_else(|| {
            SyncError::validation(format!("organisation {id} has no CVR relation"))
        })?;
        let cvr = Cvr::new(digits)?;

        let company = self
            .retry
            .execute(|| self.registry.get_company(&cvr))
            .await?;

        let fragments = self.comparator.compare(organisation, &company);
        if fragments.is_empty() {
            return Ok(None);
        }

        let document = assemble_document(&fragments);
        self.store
            .update(EntityKind::Organisation, id, &document)
            .await?;

        info!(
            organisation = %id,
            cvr = %cvr,
            fields = fragments.len(),
            "organisation refreshed"
        );
        Ok(Some(document))
    }
}
