use async_trait::async_trait;
use indexmap::IndexMap;
use patient_core::{PatientError, PatientQuery, StorageDocument};
use serde_json::{Map, Value as JsonValue};
use tokio::sync::RwLock;

use super::PatientRepository;

type Document = Map<String, JsonValue>;

/// In-memory document store keyed by patient id.
///
/// Documents are kept as raw JSON objects in insertion order, so `find`
/// returns hits in the order they were created.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    documents: RwLock<IndexMap<String, Document>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn decode(doc: &Document) -> Result<StorageDocument, PatientError> {
    StorageDocument::from_json(JsonValue::Object(doc.clone()))
}

#[async_trait]
impl PatientRepository for InMemoryRepository {
    async fn ensure_indexes(&self) -> Result<(), PatientError> {
        Ok(())
    }

    async fn insert(&self, doc: &StorageDocument) -> Result<(), PatientError> {
        let json = doc.to_json()?;
        let mut documents = self.documents.write().await;

        if documents.contains_key(doc.id()) {
            return Err(PatientError::DuplicateIdentity(doc.id().to_string()));
        }

        documents.insert(doc.id().to_string(), json);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StorageDocument>, PatientError> {
        let documents = self.documents.read().await;
        documents.get(id).map(decode).transpose()
    }

    async fn replace(&self, id: &str, doc: &StorageDocument) -> Result<u64, PatientError> {
        let json = doc.to_json()?;
        let mut documents = self.documents.write().await;

        match documents.get_mut(id) {
            Some(existing) => {
                *existing = json;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn partial_update(
        &self,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> Result<u64, PatientError> {
        let mut documents = self.documents.write().await;

        match documents.get_mut(id) {
            Some(existing) => {
                existing.extend(fields);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: &str) -> Result<u64, PatientError> {
        let mut documents = self.documents.write().await;
        Ok(documents.shift_remove(id).map_or(0, |_| 1))
    }

    async fn find(&self, query: &PatientQuery) -> Result<Vec<StorageDocument>, PatientError> {
        let documents = self.documents.read().await;

        documents
            .values()
            .filter(|doc| query.predicate.matches(doc))
            .skip(query.offset)
            .take(query.limit)
            .map(decode)
            .collect()
    }

    async fn ping(&self) -> Result<(), PatientError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
