//! patient-core: Patient storage-transformation and query-construction layer
//!
//! Pure, synchronous building blocks shared by the REST and GraphQL
//! adapters: the canonical Patient model, provenance stamps, the
//! denormalized storage projection, search predicates and constrained
//! patches. Nothing here performs I/O.

pub mod bundle;
pub mod denormalize;
pub mod error;
pub mod identifier;
pub mod meta;
pub mod outcome;
pub mod patch;
pub mod patient;
pub mod search;
pub mod storage;

pub use bundle::{Bundle, BundleEntry, BundleType};
pub use denormalize::{DenormalizedFields, denormalize};
pub use error::PatientError;
pub use identifier::{IdentifierLookup, extract_identifiers};
pub use meta::generate_meta;
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use patch::PatientPatch;
pub use patient::{Address, HumanName, Identifier, Meta, Patient};
pub use search::{PatientQuery, Predicate, SearchParams, build_query};
pub use storage::{DERIVED_FIELDS, INDEXED_FIELDS, StorageDocument, prepare_for_storage};
