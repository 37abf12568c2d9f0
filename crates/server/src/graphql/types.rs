//! GraphQL object and input types mirroring the canonical Patient model

use async_graphql::{InputObject, SimpleObject};
use patient_core::{Address, HumanName, Identifier, Meta, Patient, PatientPatch};

#[derive(SimpleObject)]
#[graphql(name = "Meta")]
pub struct MetaObject {
    pub version_id: String,
    pub last_updated: String,
    pub source: String,
}

#[derive(SimpleObject)]
#[graphql(name = "Identifier")]
pub struct IdentifierObject {
    pub system: String,
    pub value: String,
    #[graphql(name = "type")]
    pub kind: String,
    pub expiry: Option<String>,
}

#[derive(SimpleObject)]
#[graphql(name = "HumanName")]
pub struct HumanNameObject {
    #[graphql(name = "use")]
    pub name_use: String,
    pub family: String,
    pub given: Vec<String>,
}

#[derive(SimpleObject)]
#[graphql(name = "Address")]
pub struct AddressObject {
    pub flat: Option<String>,
    pub building: Option<String>,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
    pub block: Option<String>,
    pub area: Option<String>,
    pub governorate: Option<String>,
    pub country: Option<String>,
}

#[derive(SimpleObject)]
#[graphql(name = "Patient")]
pub struct PatientObject {
    pub id: String,
    pub resource_type: String,
    pub meta: Option<MetaObject>,
    pub identifiers: Vec<IdentifierObject>,
    pub name: Vec<HumanNameObject>,
    pub address: Option<AddressObject>,
    pub birth_date: String,
    pub gender: String,
    pub active: bool,
}

#[derive(InputObject)]
pub struct AddressInput {
    pub flat: Option<String>,
    pub building: Option<String>,
    pub road_name: Option<String>,
    pub road_number: Option<String>,
    pub block: Option<String>,
    pub area: Option<String>,
    pub governorate: Option<String>,
    pub country: Option<String>,
}

#[derive(InputObject)]
pub struct IdentifierInput {
    pub system: String,
    pub value: String,
    #[graphql(name = "type")]
    pub kind: String,
    pub expiry: Option<String>,
}

#[derive(InputObject)]
pub struct HumanNameInput {
    #[graphql(name = "use", default_with = "String::from(\"official\")")]
    pub name_use: String,
    pub family: String,
    #[graphql(default)]
    pub given: Vec<String>,
}

/// Full patient for create and replace
#[derive(InputObject)]
pub struct PatientInput {
    pub id: Option<String>,
    #[graphql(default)]
    pub identifiers: Vec<IdentifierInput>,
    #[graphql(default)]
    pub name: Vec<HumanNameInput>,
    pub address: Option<AddressInput>,
    pub birth_date: String,
    pub gender: String,
    #[graphql(default = true)]
    pub active: bool,
}

/// Fields accepted by `patchPatient`
#[derive(InputObject)]
pub struct PatientPatchInput {
    pub identifiers: Option<Vec<IdentifierInput>>,
    pub name: Option<Vec<HumanNameInput>>,
    pub address: Option<AddressInput>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub active: Option<bool>,
}

impl From<Meta> for MetaObject {
    fn from(meta: Meta) -> Self {
        Self {
            version_id: meta.version_id,
            last_updated: meta.last_updated,
            source: meta.source,
        }
    }
}

impl From<Identifier> for IdentifierObject {
    fn from(id: Identifier) -> Self {
        Self {
            system: id.system,
            value: id.value,
            kind: id.kind,
            expiry: id.expiry,
        }
    }
}

impl From<HumanName> for HumanNameObject {
    fn from(name: HumanName) -> Self {
        Self {
            name_use: name.name_use,
            family: name.family,
            given: name.given,
        }
    }
}

impl From<Address> for AddressObject {
    fn from(a: Address) -> Self {
        Self {
            flat: a.flat,
            building: a.building,
            road_name: a.road_name,
            road_number: a.road_number,
            block: a.block,
            area: a.area,
            governorate: a.governorate,
            country: a.country,
        }
    }
}

impl From<AddressInput> for Address {
    fn from(a: AddressInput) -> Self {
        Self {
            flat: a.flat,
            building: a.building,
            road_name: a.road_name,
            road_number: a.road_number,
            block: a.block,
            area: a.area,
            governorate: a.governorate,
            country: a.country,
        }
    }
}

impl From<Patient> for PatientObject {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            resource_type: p.resource_type,
            meta: p.meta.map(Into::into),
            identifiers: p.identifiers.into_iter().map(Into::into).collect(),
            name: p.name.into_iter().map(Into::into).collect(),
            address: p.address.map(Into::into),
            birth_date: p.birth_date,
            gender: p.gender,
            active: p.active,
        }
    }
}

impl From<IdentifierInput> for Identifier {
    fn from(id: IdentifierInput) -> Self {
        Self {
            system: id.system,
            value: id.value,
            kind: id.kind,
            expiry: id.expiry,
        }
    }
}

impl From<HumanNameInput> for HumanName {
    fn from(name: HumanNameInput) -> Self {
        Self {
            name_use: name.name_use,
            family: name.family,
            given: name.given,
        }
    }
}

impl From<PatientInput> for Patient {
    fn from(input: PatientInput) -> Self {
        let mut patient = Patient::new(
            input.name.into_iter().map(Into::into).collect(),
            input.gender,
            input.birth_date,
        );
        patient.id = input.id.unwrap_or_default();
        patient.identifiers = input.identifiers.into_iter().map(Into::into).collect();
        patient.address = input.address.map(Into::into);
        patient.active = input.active;
        patient
    }
}

impl From<PatientPatchInput> for PatientPatch {
    fn from(input: PatientPatchInput) -> Self {
        Self {
            identifiers: input
                .identifiers
                .map(|ids| ids.into_iter().map(Into::into).collect()),
            name: input.name.map(|names| names.into_iter().map(Into::into).collect()),
            address: input.address.map(Into::into),
            birth_date: input.birth_date,
            gender: input.gender,
            active: input.active,
        }
    }
}
