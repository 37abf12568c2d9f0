//! Lookup fields extracted from typed identifiers

use serde::{Deserialize, Serialize};

use crate::patient::{IDENTIFIER_TYPE_MRN, IDENTIFIER_TYPE_PASSPORT, Identifier};

/// Denormalized identifier values, one per well-known identifier type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifierLookup {
    #[serde(default)]
    pub mrn: Option<String>,
    #[serde(default)]
    pub identifier_passport: Option<String>,
}

/// Extract lookup fields from `identifiers`.
///
/// Later identifiers of the same type overwrite earlier ones. Unknown types are ignored.
pub fn extract_identifiers(identifiers: &[Identifier]) -> IdentifierLookup {
    let mut lookup = IdentifierLookup::default();

    for identifier in identifiers {
        match identifier.kind.as_str() {
            IDENTIFIER_TYPE_MRN => lookup.mrn = Some(identifier.value.clone()),
            IDENTIFIER_TYPE_PASSPORT => {
                lookup.identifier_passport = Some(identifier.value.clone())
            }
            _ => {}
        }
    }

    lookup
}
