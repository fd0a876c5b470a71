//! Declared field comparisons per entity kind
//!
//! The comparison triples used by the notification agents. Declared
//! once per entity field; the driver in [`crate::compare`] does the
//! rest.

use regsync_core::{OrganisationRecord, CVR_URN_PREFIX};
use regsync_connector::CvrCompany;

use crate::compare::{guarded, Comparator, FieldComparison, FieldValue};
use crate::update::UpdateFragment;

/// Comparator bringing an authoritative organisation in line with the
/// company registry.
#[must_use]
pub fn organisation_comparator() -> Comparator<OrganisationRecord, CvrCompany> {
    Comparator::new(vec![
        FieldComparison::new(
            "organisationsnavn",
            |org: &OrganisationRecord| org.properties().and_then(|p| p.name.clone()).map(FieldValue::from),
            |company: &CvrCompany| Some(FieldValue::from(company.name.clone())),
            guarded(|value| {
                UpdateFragment::single(
                    "attributter",
                    "organisationegenskaber",
                    "organisationsnavn",
                    value.to_plain_string(),
                )
            }),
        ),
        FieldComparison::new(
            "virksomhedsform",
            |org: &OrganisationRecord| {
                org.properties()
                    .and_then(|p| p.company_form.clone())
                    .map(FieldValue::from)
            },
            |company: &CvrCompany| company.company_form.clone().map(FieldValue::from),
            guarded(|value| {
                UpdateFragment::single(
                    "attributter",
                    "organisationegenskaber",
                    "virksomhedsform",
                    value.to_plain_string(),
                )
            }),
        ),
        FieldComparison::new(
            "branche",
            |org: &OrganisationRecord| {
                org.properties()
                    .and_then(|p| p.industry_code.clone())
                    .map(FieldValue::from)
            },
            |company: &CvrCompany| company.industry_code.clone().map(FieldValue::from),
            guarded(|value| {
                UpdateFragment::single(
                    "attributter",
                    "organisationegenskaber",
                    "branche",
                    value.to_plain_string(),
                )
            }),
        ),
        FieldComparison::new(
            "cvr",
            |org: &OrganisationRecord| org.cvr_digits().map(FieldValue::from),
            |company: &CvrCompany| Some(FieldValue::from(company.cvr.as_str())),
            guarded(|value| {
                UpdateFragment::single(
                    "relationer",
                    "virksomhed",
                    "urn",
                    format!("{CVR_URN_PREFIX}{}", value.to_plain_string()),
                )
            }),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use regsync_core::{
        Cvr, OrganisationAttributes, OrganisationProperties, OrganisationRelations, RelationRef,
    };

    fn valid_cvr() -> Cvr {
        for tail in 0..100 {
            if let Ok(cvr) = Cvr::new(&format!("251052{tail:02}")) {
                return cvr;
            }
        }
        unreachable!("some tail always verifies");
    }

    fn organisation(name: &str) -> OrganisationRecord {
        OrganisationRecord {
            attributes: OrganisationAttributes {
                properties: vec![OrganisationProperties {
                    name: Some(name.to_string()),
                    company_form: Some("80".to_string()),
                    industry_code: None,
                    virkning: None,
                }],
            },
            relations: OrganisationRelations {
                company: vec![RelationRef::to_urn(format!(
                    "{CVR_URN_PREFIX}{}",
                    valid_cvr().as_str()
                ))],
                addresses: vec![],
            },
            ..OrganisationRecord::default()
        }
    }

    fn company(name: &str) -> CvrCompany {
        CvrCompany {
            cvr: valid_cvr(),
            name: name.to_string(),
            company_form: Some("80".to_string()),
            industry_code: None,
            address: None,
            phone: None,
            email: None,
        }
    }

    #[test]
    fn test_renamed_organisation_yields_one_name_fragment() {
        let updates =
            organisation_comparator().compare(&organisation("Old Name ApS"), &company("New Name ApS"));

        assert_eq!(updates.len(), 1);
        let frag = &updates[0];
        assert_eq!(frag.section, "attributter");
        assert_eq!(frag.key, "organisationegenskaber");
        assert_eq!(frag.update["organisationsnavn"], "New Name ApS");
        assert_eq!(frag.update["virkning"]["to"], "infinity");
    }

    #[test]
    fn test_identical_records_yield_nothing() {
        let updates =
            organisation_comparator().compare(&organisation("Same ApS"), &company("Same ApS"));
        assert!(updates.is_empty());
    }

    #[test]
    fn test_absent_source_field_is_silently_skipped() {
        // The registry knows an industry code, the notification does
        // not carry one: no fragment, never an update to blank.
        let mut org = organisation("Same ApS");
        org.attributes.properties[0].industry_code = Some("360000".to_string());
        let updates = organisation_comparator().compare(&org, &company("Same ApS"));
        assert!(updates.is_empty());
    }

    #[test]
    fn test_absent_authoritative_cvr_is_silently_skipped() {
        let mut org = organisation("Same ApS");
        org.relations.company.clear();
        let updates = organisation_comparator().compare(&org, &company("Same ApS"));
        assert!(updates.is_empty());
    }

    #[test]
    fn test_changed_form_targets_properties_section() {
        let mut org = organisation("Same ApS");
        org.attributes.properties[0].company_form = Some("60".to_string());
        let updates = organisation_comparator().compare(&org, &company("Same ApS"));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update["virksomhedsform"], "80");
    }
}
