//! Registry records
//!
//! Typed schemas for the objects held by the authoritative store. The
//! wire format is the OIO object shape (sections `attributter`,
//! `relationer`, `tilstande`); fields the store may omit are explicit
//! `Option`s, so malformed payloads are rejected when deserialized at
//! the boundary instead of failing deep inside the engine.

use serde::{Deserialize, Serialize};

use crate::ids::RegistryId;
use crate::virkning::Virkning;

/// URN prefix for CVR-backed company relations.
pub const CVR_URN_PREFIX: &str = "urn:dk:cvr:";

/// URN prefix for CPR-backed person relations.
pub const CPR_URN_PREFIX: &str = "urn:dk:cpr:";

/// A record in the authoritative store, tagged by entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryRecord {
    Organisation(OrganisationRecord),
    Person(PersonRecord),
}

impl RegistryRecord {
    /// The registry identifier, if the record has been stored.
    #[must_use]
    pub fn id(&self) -> Option<RegistryId> {
        match self {
            RegistryRecord::Organisation(r) => r.id,
            RegistryRecord::Person(r) => r.id,
        }
    }
}

/// A reference from one registry object to another, or to an external
/// numbering scheme via URN.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationRef {
    /// Target object in the authoritative store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<RegistryId>,

    /// External scheme reference, e.g. `urn:dk:cvr:25052943`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub virkning: Option<Virkning>,
}

impl RelationRef {
    /// Reference to another stored object.
    #[must_use]
    pub fn to_object(id: RegistryId) -> Self {
        Self {
            uuid: Some(id),
            urn: None,
            virkning: None,
        }
    }

    /// Reference into an external numbering scheme.
    pub fn to_urn(urn: impl Into<String>) -> Self {
        Self {
            uuid: None,
            urn: Some(urn.into()),
            virkning: None,
        }
    }
}

/// An organisation object (CVR-backed).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrganisationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RegistryId>,

    #[serde(rename = "attributter", default)]
    pub attributes: OrganisationAttributes,

    #[serde(rename = "relationer", default)]
    pub relations: OrganisationRelations,

    #[serde(rename = "tilstande", default)]
    pub states: OrganisationStates,
}

impl OrganisationRecord {
    /// The currently effective property set, if any.
    ///
    /// The store returns property sets most-recent-first; the agents
    /// only ever read the head.
    #[must_use]
    pub fn properties(&self) -> Option<&OrganisationProperties> {
        self.attributes.properties.first()
    }

    /// The CVR number carried on the company relation, if present.
    #[must_use]
    pub fn cvr_digits(&self) -> Option<&str> {
        self.relations
            .company
            .first()
            .and_then(|r| r.urn.as_deref())
            .and_then(|urn| urn.strip_prefix(CVR_URN_PREFIX))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrganisationAttributes {
    #[serde(rename = "organisationegenskaber", default)]
    pub properties: Vec<OrganisationProperties>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrganisationProperties {
    #[serde(rename = "organisationsnavn", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Legal company form code (e.g. "80" for ApS).
    #[serde(rename = "virksomhedsform", skip_serializing_if = "Option::is_none")]
    pub company_form: Option<String>,

    /// Industry code from the business register.
    #[serde(rename = "branche", skip_serializing_if = "Option::is_none")]
    pub industry_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub virkning: Option<Virkning>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrganisationRelations {
    /// CVR relation (`urn:dk:cvr:<digits>`).
    #[serde(rename = "virksomhed", default, skip_serializing_if = "Vec::is_empty")]
    pub company: Vec<RelationRef>,

    #[serde(rename = "adresser", default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<RelationRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrganisationStates {
    #[serde(rename = "organisationgyldighed", default)]
    pub validity: Vec<ValidityState>,
}

/// A person object (CPR-backed).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RegistryId>,

    #[serde(rename = "attributter", default)]
    pub attributes: PersonAttributes,

    #[serde(rename = "relationer", default)]
    pub relations: PersonRelations,

    #[serde(rename = "tilstande", default)]
    pub states: PersonStates,
}

impl PersonRecord {
    /// The currently effective property set, if any.
    #[must_use]
    pub fn properties(&self) -> Option<&PersonProperties> {
        self.attributes.properties.first()
    }

    /// The CPR number carried on the person relation, if present.
    #[must_use]
    pub fn cpr_digits(&self) -> Option<&str> {
        self.relations
            .persons
            .first()
            .and_then(|r| r.urn.as_deref())
            .and_then(|urn| urn.strip_prefix(CPR_URN_PREFIX))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonAttributes {
    #[serde(rename = "brugeregenskaber", default)]
    pub properties: Vec<PersonProperties>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonProperties {
    #[serde(rename = "brugernavn", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "fornavn", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "efternavn", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub virkning: Option<Virkning>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonRelations {
    /// CPR relation (`urn:dk:cpr:<digits>`).
    #[serde(
        rename = "tilknyttedepersoner",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub persons: Vec<RelationRef>,

    #[serde(rename = "adresser", default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<RelationRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonStates {
    #[serde(rename = "brugergyldighed", default)]
    pub validity: Vec<ValidityState>,
}

/// Lifecycle state entry shared by all record kinds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidityState {
    /// `"Aktiv"` or `"Inaktiv"`.
    #[serde(rename = "gyldighed", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub virkning: Option<Virkning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_organisation() -> OrganisationRecord {
        OrganisationRecord {
            id: Some(RegistryId::new()),
            attributes: OrganisationAttributes {
                properties: vec![OrganisationProperties {
                    name: Some("Old Name ApS".to_string()),
                    company_form: Some("80".to_string()),
                    industry_code: None,
                    virkning: None,
                }],
            },
            relations: OrganisationRelations {
                company: vec![RelationRef::to_urn("urn:dk:cvr:25052943")],
                addresses: vec![],
            },
            states: OrganisationStates::default(),
        }
    }

    #[test]
    fn test_organisation_properties_head() {
        let org = sample_organisation();
        assert_eq!(org.properties().unwrap().name.as_deref(), Some("Old Name ApS"));
    }

    #[test]
    fn test_organisation_cvr_digits() {
        let org = sample_organisation();
        assert_eq!(org.cvr_digits(), Some("25052943"));
    }

    #[test]
    fn test_organisation_missing_relations_is_none_not_panic() {
        let org = OrganisationRecord::default();
        assert!(org.cvr_digits().is_none());
        assert!(org.properties().is_none());
    }

    #[test]
    fn test_organisation_wire_names() {
        let org = sample_organisation();
        let json = serde_json::to_value(&org).unwrap();
        assert!(json.get("attributter").is_some());
        assert!(json["attributter"].get("organisationegenskaber").is_some());
        assert_eq!(
            json["attributter"]["organisationegenskaber"][0]["organisationsnavn"],
            "Old Name ApS"
        );
        assert_eq!(json["relationer"]["virksomhed"][0]["urn"], "urn:dk:cvr:25052943");
    }

    #[test]
    fn test_rejects_malformed_payload_at_boundary() {
        // attributter must be an object, not a scalar.
        let raw = r#"{"attributter": 42}"#;
        let parsed: Result<OrganisationRecord, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_tagged_record_roundtrip() {
        let record = RegistryRecord::Organisation(sample_organisation());
        let json = serde_json::to_string(&record).unwrap();
        let parsed: RegistryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(parsed.id().is_some());
    }

    #[test]
    fn test_person_cpr_digits() {
        let person = PersonRecord {
            relations: PersonRelations {
                persons: vec![RelationRef::to_urn("urn:dk:cpr:0101701234")],
                addresses: vec![],
            },
            ..PersonRecord::default()
        };
        assert_eq!(person.cpr_digits(), Some("0101701234"));
    }
}
