//! Flattening of nested name/address structures into indexable scalars

use serde::{Deserialize, Serialize};

use crate::patient::{Address, HumanName};

/// Scalar fields derived from `name[0]` and `address`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DenormalizedFields {
    #[serde(default)]
    pub name_0_family: Option<String>,
    #[serde(default)]
    pub name_0_given: Option<String>,
    #[serde(default)]
    pub address_country: Option<String>,
    #[serde(default)]
    pub address_governorate: Option<String>,
    #[serde(default)]
    pub address_area: Option<String>,
}

pub fn denormalize(name: &[HumanName], address: Option<&Address>) -> DenormalizedFields {
    let mut fields = DenormalizedFields::default();

    if let Some(first) = name.first() {
        fields.name_0_family = Some(first.family.clone());
        fields.name_0_given = first.given.first().cloned();
    }

    if let Some(address) = address {
        fields.address_country = address.country.clone();
        fields.address_governorate = address.governorate.clone();
        fields.address_area = address.area.clone();
    }

    fields
}
