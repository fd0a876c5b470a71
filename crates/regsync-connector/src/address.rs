//! Address resolution service contract
//!
//! Structured lookup is tried first; free-text fuzzy lookup is a
//! fallback only. An ambiguous multi-match fails closed: no identifier
//! is returned, the caller reports and skips.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

use regsync_core::ExternalRef;

/// A structured postal address as carried by the source systems.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredAddress {
    pub street_name: String,

    pub house_number: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub door: Option<String>,

    pub postal_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl StructuredAddress {
    /// Render the single-line form used for fuzzy lookup.
    #[must_use]
    pub fn free_text(&self) -> String {
        let mut text = format!("{} {}", self.street_name, self.house_number);
        if let Some(floor) = &self.floor {
            text.push_str(&format!(", {floor}"));
        }
        if let Some(door) = &self.door {
            text.push_str(&format!(". {door}"));
        }
        text.push_str(&format!(", {}", self.postal_code));
        if let Some(city) = &self.city {
            text.push_str(&format!(" {city}"));
        }
        text
    }
}

/// The national address-lookup service.
#[async_trait]
pub trait AddressService: Send + Sync {
    /// Resolve a fully structured address to its service identifier.
    /// Fails with `NotFound` when no entry matches and `Ambiguous`
    /// when more than one does.
    async fn resolve_exact(&self, address: &StructuredAddress) -> SyncResult<ExternalRef>;

    /// Free-text match; same failure contract as `resolve_exact`.
    async fn resolve_fuzzy(&self, free_text: &str) -> SyncResult<ExternalRef>;
}

/// Resolve an address: exact first, fuzzy as fallback.
///
/// Fuzzy lookup is attempted only when the exact lookup found nothing.
/// Ambiguity at either stage propagates (fails closed); guessing among
/// candidates is never acceptable for address wiring.
pub async fn resolve_address(
    service: &dyn AddressService,
    address: &StructuredAddress,
) -> SyncResult<ExternalRef> {
    match service.resolve_exact(address).await {
        Ok(id) => Ok(id),
        Err(SyncError::NotFound { .. }) => service.resolve_fuzzy(&address.free_text()).await,
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regsync_core::EntityKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeAddressService {
        exact_result: fn() -> SyncResult<ExternalRef>,
        fuzzy_result: fn() -> SyncResult<ExternalRef>,
        exact_calls: AtomicUsize,
        fuzzy_calls: AtomicUsize,
    }

    #[async_trait]
    impl AddressService for FakeAddressService {
        async fn resolve_exact(&self, _address: &StructuredAddress) -> SyncResult<ExternalRef> {
            self.exact_calls.fetch_add(1, Ordering::SeqCst);
            (self.exact_result)()
        }

        async fn resolve_fuzzy(&self, _free_text: &str) -> SyncResult<ExternalRef> {
            self.fuzzy_calls.fetch_add(1, Ordering::SeqCst);
            (self.fuzzy_result)()
        }
    }

    fn sample_address() -> StructuredAddress {
        StructuredAddress {
            street_name: "Hovedgaden".to_string(),
            house_number: "12B".to_string(),
            floor: Some("2".to_string()),
            door: Some("tv".to_string()),
            postal_code: "8000".to_string(),
            city: Some("Aarhus C".to_string()),
        }
    }

    #[test]
    fn test_free_text_rendering() {
        assert_eq!(
            sample_address().free_text(),
            "Hovedgaden 12B, 2. tv, 8000 Aarhus C"
        );
    }

    #[tokio::test]
    async fn test_exact_hit_skips_fuzzy() {
        let svc = FakeAddressService {
            exact_result: || Ok(ExternalRef::new("addr-1")),
            fuzzy_result: || panic!("fuzzy must not be called"),
            exact_calls: AtomicUsize::new(0),
            fuzzy_calls: AtomicUsize::new(0),
        };

        let id = resolve_address(&svc, &sample_address()).await.unwrap();
        assert_eq!(id.as_str(), "addr-1");
        assert_eq!(svc.exact_calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.fuzzy_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_found_falls_back_to_fuzzy() {
        let svc = FakeAddressService {
            exact_result: || Err(SyncError::not_found(EntityKind::Address, "x")),
            fuzzy_result: || Ok(ExternalRef::new("addr-fuzzy")),
            exact_calls: AtomicUsize::new(0),
            fuzzy_calls: AtomicUsize::new(0),
        };

        let id = resolve_address(&svc, &sample_address()).await.unwrap();
        assert_eq!(id.as_str(), "addr-fuzzy");
        assert_eq!(svc.fuzzy_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_fails_closed_without_fallback() {
        let svc = FakeAddressService {
            exact_result: || Err(SyncError::ambiguous("Hovedgaden 12B", 3)),
            fuzzy_result: || panic!("fuzzy must not be called on ambiguity"),
            exact_calls: AtomicUsize::new(0),
            fuzzy_calls: AtomicUsize::new(0),
        };

        let err = resolve_address(&svc, &sample_address()).await.unwrap_err();
        assert_eq!(err.error_code(), "AMBIGUOUS");
        assert_eq!(svc.fuzzy_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fuzzy_ambiguity_propagates() {
        let svc = FakeAddressService {
            exact_result: || Err(SyncError::not_found(EntityKind::Address, "x")),
            fuzzy_result: || Err(SyncError::ambiguous("Hovedgaden 12B", 2)),
            exact_calls: AtomicUsize::new(0),
            fuzzy_calls: AtomicUsize::new(0),
        };

        let err = resolve_address(&svc, &sample_address()).await.unwrap_err();
        assert_eq!(err.error_code(), "AMBIGUOUS");
    }
}
