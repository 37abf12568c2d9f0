//! Provenance stamp generation

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::patient::Meta;

/// Number of leading decimal digits of a random 128-bit value kept as the version token.
const VERSION_TOKEN_DIGITS: usize = 8;

/// Produce a fresh `meta` block for a write.
///
/// Reads the clock and the random source; nothing else.
pub fn generate_meta() -> Meta {
    let version_id: String = Uuid::new_v4()
        .as_u128()
        .to_string()
        .chars()
        .take(VERSION_TOKEN_DIGITS)
        .collect();

    Meta {
        version_id,
        last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        source: format!("urn:uuid:{}", Uuid::new_v4()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn source_is_urn_uuid() {
        let meta = generate_meta();
        let raw = meta.source.strip_prefix("urn:uuid:").unwrap();
        assert!(Uuid::parse_str(raw).is_ok());
    }

    #[test]
    fn last_updated_is_utc_rfc3339() {
        let meta = generate_meta();
        assert!(meta.last_updated.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.last_updated).is_ok());
    }

    #[test]
    fn version_token_is_short_and_numeric() {
        let meta = generate_meta();
        assert!(!meta.version_id.is_empty());
        assert!(meta.version_id.len() <= VERSION_TOKEN_DIGITS);
        assert!(meta.version_id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn successive_stamps_differ() {
        let stamps: HashSet<(String, String)> = (0..1000)
            .map(|_| {
                let m = generate_meta();
                (m.version_id, m.source)
            })
            .collect();
        assert_eq!(stamps.len(), 1000);
    }
}
