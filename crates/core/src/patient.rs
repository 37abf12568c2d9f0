//! Canonical Patient resource model.
//!
//! These types describe the Patient as exchanged with clients, in nested
//! form. The flattened storage projection lives in [`crate::storage`].

use serde::{Deserialize, Serialize};

use crate::error::PatientError;

/// The only accepted value of `resourceType`.
pub const RESOURCE_TYPE: &str = "Patient";

/// Well-known identifier discriminators
pub const IDENTIFIER_TYPE_MRN: &str = "MRN";
pub const IDENTIFIER_TYPE_PASSPORT: &str = "PASSPORT";

/// Longest id accepted, as for FHIR resource ids.
pub const MAX_ID_LEN: usize = 64;

fn default_resource_type() -> String {
    RESOURCE_TYPE.to_string()
}

fn default_active() -> bool {
    true
}

/// Version and provenance stamp, regenerated on every write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub version_id: String,
    pub last_updated: String,
    pub source: String,
}

/// A typed business identifier (medical record number, passport, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identifier {
    pub system: String,
    pub value: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

impl Identifier {
    pub fn new(system: impl Into<String>, kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            value: value.into(),
            kind: kind.into(),
            expiry: None,
        }
    }
}

/// A human name entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HumanName {
    #[serde(rename = "use")]
    pub name_use: String,
    pub family: String,
    #[serde(default)]
    pub given: Vec<String>,
}

impl HumanName {
    pub fn official(family: impl Into<String>, given: &[&str]) -> Self {
        Self {
            name_use: "official".to_string(),
            family: family.into(),
            given: given.iter().map(|g| g.to_string()).collect(),
        }
    }
}

/// Postal address. Only `country`, `governorate` and `area` are indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governorate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Patient resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub id: String,

    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default)]
    pub identifiers: Vec<Identifier>,

    #[serde(default)]
    pub name: Vec<HumanName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    pub birth_date: String,
    pub gender: String,

    #[serde(default = "default_active")]
    pub active: bool,
}

impl Patient {
    /// Create a patient with no id, identifiers or address.
    pub fn new(name: Vec<HumanName>, gender: impl Into<String>, birth_date: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            resource_type: default_resource_type(),
            meta: None,
            identifiers: Vec::new(),
            name,
            address: None,
            birth_date: birth_date.into(),
            gender: gender.into(),
            active: true,
        }
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), PatientError> {
        if self.resource_type != RESOURCE_TYPE {
            return Err(PatientError::Validation(format!(
                "Expected resourceType '{}', got '{}'",
                RESOURCE_TYPE, self.resource_type
            )));
        }
        // Empty ids are assigned at storage time
        if !self.id.is_empty() && !is_valid_id(&self.id) {
            return Err(PatientError::Validation(format!(
                "Invalid id '{}': expected 1-{} characters of A-Z, a-z, 0-9, '-' or '.'",
                self.id.escape_debug(),
                MAX_ID_LEN
            )));
        }
        Ok(())
    }
}

/// FHIR id charset. Ids end up in URLs and `Location` headers.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_with_defaults() {
        let patient: Patient = serde_json::from_value(json!({
            "name": [{"use": "official", "family": "Lee", "given": ["Ann"]}],
            "birthDate": "1990-01-01",
            "gender": "female"
        }))
        .unwrap();

        assert_eq!(patient.id, "");
        assert_eq!(patient.resource_type, "Patient");
        assert!(patient.active);
        assert!(patient.identifiers.is_empty());
        assert!(patient.validate().is_ok());
    }

    #[test]
    fn identifier_type_uses_wire_name() {
        let id = Identifier::new("urn:hospital", IDENTIFIER_TYPE_MRN, "123");
        let value = serde_json::to_value(&id).unwrap();
        assert_eq!(value["type"], "MRN");
        assert!(value.get("expiry").is_none());
    }

    #[test]
    fn rejects_foreign_resource_type() {
        let mut patient = Patient::new(vec![], "male", "1980-02-03");
        patient.resource_type = "Observation".to_string();
        assert!(matches!(patient.validate(), Err(PatientError::Validation(_))));
    }

    #[test]
    fn rejects_ids_outside_fhir_charset() {
        let mut patient = Patient::new(vec![], "male", "1980-02-03");
        let too_long = "x".repeat(MAX_ID_LEN + 1);
        for bad in ["a\nb", "a b", "a/b", "ä", too_long.as_str()] {
            patient.id = bad.to_string();
            assert!(
                matches!(patient.validate(), Err(PatientError::Validation(_))),
                "accepted {:?}",
                bad
            );
        }

        for good in ["p1", "fixed-id", "a.b", "550e8400-e29b-41d4-a716-446655440000"] {
            patient.id = good.to_string();
            assert!(patient.validate().is_ok(), "rejected {:?}", good);
        }
    }
}
