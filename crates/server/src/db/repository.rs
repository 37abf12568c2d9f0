use async_trait::async_trait;
use patient_core::{PatientError, PatientQuery, StorageDocument};
use serde_json::{Map, Value as JsonValue};

/// Storage contract for Patient documents.
///
/// Implementations enforce id uniqueness and report it as
/// `PatientError::DuplicateIdentity`; I/O failures surface as
/// `PatientError::StoreUnavailable`. Nothing here retries.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Create the indexes used by search. Safe to call repeatedly.
    async fn ensure_indexes(&self) -> Result<(), PatientError>;

    async fn insert(&self, doc: &StorageDocument) -> Result<(), PatientError>;

    async fn get(&self, id: &str) -> Result<Option<StorageDocument>, PatientError>;

    /// Replace the whole document. Returns the number of documents modified.
    async fn replace(&self, id: &str, doc: &StorageDocument) -> Result<u64, PatientError>;

    /// Overwrite the given top-level fields. Returns the number of documents modified.
    async fn partial_update(
        &self,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> Result<u64, PatientError>;

    /// Returns the number of documents deleted.
    async fn delete(&self, id: &str) -> Result<u64, PatientError>;

    /// Filter, then skip `query.offset` and take `query.limit`.
    async fn find(&self, query: &PatientQuery) -> Result<Vec<StorageDocument>, PatientError>;

    async fn ping(&self) -> Result<(), PatientError>;

    fn backend_name(&self) -> &'static str;
}
