//! Search predicate construction.
//!
//! Optional search parameters are turned into a backend-neutral
//! [`Predicate`] tree. Each filter category becomes one clause and all
//! clauses are joined with AND, so several OR-groups can coexist.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// Page size used when the caller does not send `count`.
pub const DEFAULT_COUNT: usize = 10;

fn default_count() -> usize {
    DEFAULT_COUNT
}

/// Query parameters for patient search
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchParams {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    #[serde(default = "default_count", alias = "_count")]
    pub count: usize,
    #[serde(default, alias = "_offset")]
    pub offset: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            name: None,
            identifier: None,
            gender: None,
            birthdate: None,
            count: DEFAULT_COUNT,
            offset: 0,
        }
    }
}

impl SearchParams {
    pub fn to_query(&self) -> PatientQuery {
        build_query(
            self.name.as_deref(),
            self.identifier.as_deref(),
            self.gender.as_deref(),
            self.birthdate.as_deref(),
            self.count,
            self.offset,
        )
    }
}

/// Filter expression over storage document fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every document
    All,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Exact string equality
    Eq { field: String, value: String },
    /// Case-insensitive literal substring.
    ///
    /// ASCII folding is identical on every backend. Beyond ASCII, the
    /// in-memory store folds with Unicode lowercase mappings while Postgres
    /// `ILIKE` folds per the database's `LC_CTYPE`, so non-ASCII names can
    /// match differently under a `C` locale.
    ContainsIgnoreCase { field: String, value: String },
}

impl Predicate {
    pub fn eq(field: &str, value: &str) -> Self {
        Predicate::Eq {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn contains_ignore_case(field: &str, value: &str) -> Self {
        Predicate::ContainsIgnoreCase {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Evaluate against a JSON storage document. Missing or non-string fields never match.
    pub fn matches(&self, doc: &Map<String, JsonValue>) -> bool {
        match self {
            Predicate::All => true,
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Predicate::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Predicate::Eq { field, value } => {
                doc.get(field).and_then(JsonValue::as_str) == Some(value.as_str())
            }
            Predicate::ContainsIgnoreCase { field, value } => doc
                .get(field)
                .and_then(JsonValue::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&value.to_lowercase())),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, op: &str, clauses: &[Predicate]) -> fmt::Result {
            write!(f, "{}(", op)?;
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", clause)?;
            }
            write!(f, ")")
        }

        match self {
            Predicate::All => write!(f, "all"),
            Predicate::And(clauses) => join(f, "and", clauses),
            Predicate::Or(clauses) => join(f, "or", clauses),
            Predicate::Eq { field, value } => write!(f, "{} = {:?}", field, value),
            Predicate::ContainsIgnoreCase { field, value } => {
                write!(f, "{} ~* {:?}", field, value)
            }
        }
    }
}

/// A predicate plus pagination, applied after filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientQuery {
    pub predicate: Predicate,
    pub limit: usize,
    pub offset: usize,
}

/// Build a store query from optional search parameters.
///
/// Empty strings count as absent. `limit` is not capped here.
pub fn build_query(
    name: Option<&str>,
    identifier: Option<&str>,
    gender: Option<&str>,
    birthdate: Option<&str>,
    limit: usize,
    offset: usize,
) -> PatientQuery {
    fn present(v: Option<&str>) -> Option<&str> {
        v.filter(|s| !s.is_empty())
    }

    let mut clauses = Vec::new();

    if let Some(name) = present(name) {
        clauses.push(Predicate::Or(vec![
            Predicate::contains_ignore_case("name_0_family", name),
            Predicate::contains_ignore_case("name_0_given", name),
        ]));
    }

    if let Some(identifier) = present(identifier) {
        clauses.push(Predicate::Or(vec![
            Predicate::eq("mrn", identifier),
            Predicate::eq("identifier_passport", identifier),
        ]));
    }

    if let Some(gender) = present(gender) {
        clauses.push(Predicate::eq("gender", gender));
    }

    if let Some(birthdate) = present(birthdate) {
        clauses.push(Predicate::eq("birthDate", birthdate));
    }

    let predicate = match clauses.len() {
        0 => Predicate::All,
        1 => clauses.remove(0),
        _ => Predicate::And(clauses),
    };

    PatientQuery {
        predicate,
        limit,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn query(name: Option<&str>, identifier: Option<&str>) -> Predicate {
        build_query(name, identifier, None, None, 10, 0).predicate
    }

    #[test]
    fn no_parameters_matches_everything() {
        let q = build_query(None, None, None, None, 10, 0);
        assert_eq!(q.predicate, Predicate::All);
        assert!(q.predicate.matches(&Map::new()));
    }

    #[test]
    fn empty_strings_are_ignored() {
        assert_eq!(query(Some(""), Some("")), Predicate::All);
    }

    #[test]
    fn name_matches_family_or_given_case_insensitively() {
        let p = query(Some("Smith"), None);
        assert!(p.matches(&doc(json!({"name_0_family": "SMITH", "name_0_given": "Jo"}))));
        assert!(p.matches(&doc(json!({"name_0_family": "Lee", "name_0_given": "smithy"}))));
        assert!(!p.matches(&doc(json!({"name_0_family": "Lee", "name_0_given": "Ann"}))));
        assert!(!p.matches(&doc(json!({"name_0_family": null, "name_0_given": null}))));
    }

    #[test]
    fn name_is_a_literal_substring_not_a_pattern() {
        let p = query(Some("a.c"), None);
        assert!(p.matches(&doc(json!({"name_0_family": "xa.cx"}))));
        assert!(!p.matches(&doc(json!({"name_0_family": "abc"}))));
    }

    #[test]
    fn name_folds_unicode_case_in_memory() {
        let p = query(Some("émile"), None);
        assert!(p.matches(&doc(json!({"name_0_family": "ÉMILE"}))));
        assert!(!p.matches(&doc(json!({"name_0_family": "EMILE"}))));
    }

    #[test]
    fn identifier_matches_mrn_or_passport_exactly() {
        let p = query(None, Some("X9"));
        assert!(p.matches(&doc(json!({"mrn": "X9"}))));
        assert!(p.matches(&doc(json!({"identifier_passport": "X9"}))));
        assert!(!p.matches(&doc(json!({"mrn": "x9"}))));
        assert!(!p.matches(&doc(json!({"mrn": "X99"}))));
    }

    #[test]
    fn name_and_identifier_are_both_required() {
        let p = query(Some("Lee"), Some("123"));
        assert_eq!(
            p,
            Predicate::And(vec![
                Predicate::Or(vec![
                    Predicate::contains_ignore_case("name_0_family", "Lee"),
                    Predicate::contains_ignore_case("name_0_given", "Lee"),
                ]),
                Predicate::Or(vec![
                    Predicate::eq("mrn", "123"),
                    Predicate::eq("identifier_passport", "123"),
                ]),
            ])
        );

        assert!(p.matches(&doc(json!({"name_0_family": "Lee", "mrn": "123"}))));
        assert!(!p.matches(&doc(json!({"name_0_family": "Kim", "mrn": "123"}))));
        assert!(!p.matches(&doc(json!({"name_0_family": "Lee", "mrn": "999"}))));
    }

    #[test]
    fn gender_and_birthdate_are_exact() {
        let p = build_query(None, None, Some("female"), Some("1990-01-01"), 5, 2);
        assert_eq!(p.limit, 5);
        assert_eq!(p.offset, 2);
        assert!(p.predicate.matches(&doc(json!({"gender": "female", "birthDate": "1990-01-01"}))));
        assert!(!p.predicate.matches(&doc(json!({"gender": "female", "birthDate": "1990-01"}))));
        assert!(!p.predicate.matches(&doc(json!({"gender": "male", "birthDate": "1990-01-01"}))));
    }

    #[test]
    fn params_default_pagination() {
        let params: SearchParams = serde_json::from_value(json!({"name": "Lee"})).unwrap();
        assert_eq!(params.count, DEFAULT_COUNT);
        assert_eq!(params.offset, 0);

        let params: SearchParams =
            serde_json::from_value(json!({"_count": 3, "_offset": 6})).unwrap();
        let q = params.to_query();
        assert_eq!((q.limit, q.offset), (3, 6));
    }

    #[test]
    fn display_is_readable() {
        let p = build_query(Some("Lee"), None, Some("male"), None, 10, 0).predicate;
        assert_eq!(
            p.to_string(),
            r#"and(or(name_0_family ~* "Lee", name_0_given ~* "Lee"), gender = "male")"#
        );
    }
}
