//! Constrained partial updates.
//!
//! Only the fields listed on [`PatientPatch`] can be patched. Unknown keys
//! are rejected at deserialization so nothing can slip past denormalization.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::PatientError;
use crate::patient::{Address, HumanName, Identifier, Patient};
use crate::storage::StorageDocument;

/// The updatable subset of a Patient
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatientPatch {
    pub identifiers: Option<Vec<Identifier>>,
    pub name: Option<Vec<HumanName>>,
    pub address: Option<Address>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub active: Option<bool>,
}

impl PatientPatch {
    /// Parse a patch from an arbitrary JSON body.
    pub fn from_json(value: JsonValue) -> Result<Self, PatientError> {
        serde_json::from_value(value)
            .map_err(|e| PatientError::Validation(format!("Invalid patch: {}", e)))
    }

    /// Wire names of the fields this patch sets.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.identifiers.is_some() {
            fields.push("identifiers");
        }
        if self.name.is_some() {
            fields.push("name");
        }
        if self.address.is_some() {
            fields.push("address");
        }
        if self.birth_date.is_some() {
            fields.push("birthDate");
        }
        if self.gender.is_some() {
            fields.push("gender");
        }
        if self.active.is_some() {
            fields.push("active");
        }
        fields
    }

    pub fn apply(&self, patient: &mut Patient) {
        if let Some(identifiers) = &self.identifiers {
            patient.identifiers = identifiers.clone();
        }
        if let Some(name) = &self.name {
            patient.name = name.clone();
        }
        if let Some(address) = &self.address {
            patient.address = Some(address.clone());
        }
        if let Some(birth_date) = &self.birth_date {
            patient.birth_date = birth_date.clone();
        }
        if let Some(gender) = &self.gender {
            patient.gender = gender.clone();
        }
        if let Some(active) = self.active {
            patient.active = active;
        }
    }

    /// Derived fields computed from the fields this patch sets.
    pub fn derived_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.extend(["name_0_family", "name_0_given"]);
        }
        if self.address.is_some() {
            fields.extend(["address_country", "address_governorate", "address_area"]);
        }
        if self.identifiers.is_some() {
            fields.extend(["mrn", "identifier_passport"]);
        }
        fields
    }

    /// Field map for a store-level partial update.
    ///
    /// `doc` must already reflect this patch and a fresh `meta`. The map
    /// holds the patched fields, `meta`, and the derived fields that depend
    /// on them. Derived fields of untouched sources are left alone so a
    /// concurrent patch of another field keeps its own projection.
    pub fn storage_fields(
        &self,
        doc: &StorageDocument,
    ) -> Result<Map<String, JsonValue>, PatientError> {
        let mut full = doc.to_json()?;
        let mut fields = Map::new();

        let keys = self
            .fields()
            .into_iter()
            .chain(std::iter::once("meta"))
            .chain(self.derived_fields());
        for key in keys {
            let value = full.remove(key).unwrap_or(JsonValue::Null);
            fields.insert(key.to_string(), value);
        }

        Ok(fields)
    }
}
