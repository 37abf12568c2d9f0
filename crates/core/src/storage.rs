//! Storage projection of a Patient.
//!
//! A [`StorageDocument`] is the full Patient plus a primary key and the
//! derived lookup fields. Derived fields are recomputed on every write by
//! [`prepare_for_storage`]; they are never read back as a source of truth.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::denormalize::{DenormalizedFields, denormalize};
use crate::error::PatientError;
use crate::identifier::{IdentifierLookup, extract_identifiers};
use crate::patient::Patient;

/// Every field derived at write time.
pub const DERIVED_FIELDS: [&str; 7] = [
    "name_0_family",
    "name_0_given",
    "address_country",
    "address_governorate",
    "address_area",
    "mrn",
    "identifier_passport",
];

/// Fields the document store must index for search.
pub const INDEXED_FIELDS: [&str; 6] = [
    "name_0_family",
    "name_0_given",
    "mrn",
    "identifier_passport",
    "gender",
    "birthDate",
];

/// Persisted, denormalized projection of a Patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageDocument {
    #[serde(rename = "_id")]
    pub key: String,

    #[serde(flatten)]
    pub patient: Patient,

    #[serde(flatten)]
    pub denormalized: DenormalizedFields,

    #[serde(flatten)]
    pub lookup: IdentifierLookup,
}

impl StorageDocument {
    pub fn id(&self) -> &str {
        &self.key
    }

    /// Serialize to the JSON object handed to the store.
    pub fn to_json(&self) -> Result<Map<String, JsonValue>, PatientError> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map),
            other => Err(PatientError::Validation(format!(
                "storage document serialized to non-object: {}",
                other
            ))),
        }
    }

    pub fn from_json(value: JsonValue) -> Result<Self, PatientError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Drop the storage-only fields and return the canonical resource.
    pub fn into_patient(self) -> Patient {
        self.patient
    }
}

/// Turn a validated Patient into a persistable document.
///
/// Assigns a fresh id when `patient.id` is empty. `meta` is carried as-is;
/// callers stamp it with [`crate::generate_meta`] beforehand.
pub fn prepare_for_storage(mut patient: Patient) -> StorageDocument {
    if patient.id.is_empty() {
        patient.id = Uuid::new_v4().to_string();
    }

    let denormalized = denormalize(&patient.name, patient.address.as_ref());
    let lookup = extract_identifiers(&patient.identifiers);

    StorageDocument {
        key: patient.id.clone(),
        patient,
        denormalized,
        lookup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::generate_meta;
    use crate::patient::{Address, HumanName, Identifier};
    use serde_json::json;

    fn lee() -> Patient {
        let mut patient = Patient::new(
            vec![HumanName::official("Lee", &["Ann"])],
            "female",
            "1990-04-12",
        );
        patient.identifiers = vec![
            Identifier::new("urn:hospital", "MRN", "123"),
            Identifier::new("urn:passport", "PASSPORT", "X9"),
        ];
        patient
    }

    #[test]
    fn builds_lookup_and_name_fields() {
        let doc = prepare_for_storage(lee());
        assert_eq!(doc.lookup.mrn.as_deref(), Some("123"));
        assert_eq!(doc.lookup.identifier_passport.as_deref(), Some("X9"));
        assert_eq!(doc.denormalized.name_0_family.as_deref(), Some("Lee"));
        assert_eq!(doc.denormalized.name_0_given.as_deref(), Some("Ann"));
    }

    #[test]
    fn assigns_id_when_empty() {
        let doc = prepare_for_storage(lee());
        assert!(!doc.patient.id.is_empty());
        assert_eq!(doc.key, doc.patient.id);
    }

    #[test]
    fn preserves_caller_id() {
        let mut patient = lee();
        patient.id = "patient-7".to_string();
        let doc = prepare_for_storage(patient);
        assert_eq!(doc.key, "patient-7");
        assert_eq!(doc.patient.id, "patient-7");
    }

    #[test]
    fn only_meta_differs_between_builds_of_same_patient() {
        let mut first = lee();
        first.id = "fixed".to_string();
        first.meta = Some(generate_meta());
        let mut second = first.clone();
        second.meta = Some(generate_meta());

        let mut a = prepare_for_storage(first);
        let mut b = prepare_for_storage(second);
        assert_ne!(a, b);
        a.patient.meta = None;
        b.patient.meta = None;
        assert_eq!(a, b);
    }

    #[test]
    fn json_shape_has_key_and_null_derived_fields() {
        let mut patient = Patient::new(vec![], "male", "1970-01-01");
        patient.id = "abc".to_string();
        let json = prepare_for_storage(patient).to_json().unwrap();

        assert_eq!(json["_id"], "abc");
        assert_eq!(json["id"], "abc");
        assert_eq!(json["resourceType"], "Patient");
        assert_eq!(json["birthDate"], "1970-01-01");
        for field in DERIVED_FIELDS {
            assert_eq!(json[field], JsonValue::Null, "{field} should be null");
        }
    }

    #[test]
    fn round_trips_through_json() {
        let mut patient = lee();
        patient.address = Some(Address {
            country: Some("Bahrain".into()),
            ..Default::default()
        });
        let doc = prepare_for_storage(patient);
        let restored =
            StorageDocument::from_json(JsonValue::Object(doc.to_json().unwrap())).unwrap();
        assert_eq!(restored, doc);
        assert_eq!(restored.denormalized.address_country.as_deref(), Some("Bahrain"));
    }

    #[test]
    fn into_patient_strips_storage_fields() {
        let doc = prepare_for_storage(lee());
        let value = serde_json::to_value(doc.into_patient()).unwrap();
        assert!(value.get("_id").is_none());
        assert!(value.get("mrn").is_none());
        assert_eq!(value["name"], json!([{"use": "official", "family": "Lee", "given": ["Ann"]}]));
    }
}
