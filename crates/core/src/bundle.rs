use serde::{Deserialize, Serialize};

use crate::patient::Patient;

/// FHIR Bundle types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    Searchset,
}

/// One search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    pub resource: Patient,
}

/// FHIR Bundle resource (simplified for search responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,

    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    pub total: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    /// Wrap search hits; `base` is the URL prefix used to build each `fullUrl`.
    pub fn searchset(base: &str, patients: Vec<Patient>) -> Self {
        let entry: Vec<BundleEntry> = patients
            .into_iter()
            .map(|resource| BundleEntry {
                full_url: Some(format!("{}/{}", base, resource.id)),
                resource,
            })
            .collect();

        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: BundleType::Searchset,
            total: entry.len() as u32,
            entry,
        }
    }
}
