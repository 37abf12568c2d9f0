//! Patient operations shared by the REST and GraphQL adapters.

use std::sync::Arc;

use patient_core::{
    Patient, PatientError, PatientPatch, SearchParams, generate_meta, prepare_for_storage,
};

use crate::db::PatientRepository;

/// Sequences core transformations around repository calls.
///
/// Each mutating operation stamps exactly one fresh `meta` and rebuilds
/// every derived field before the document reaches the store.
#[derive(Clone)]
pub struct PatientService {
    repo: Arc<dyn PatientRepository>,
}

impl PatientService {
    pub fn new(repo: Arc<dyn PatientRepository>) -> Self {
        Self { repo }
    }

    /// Create a patient. Fails with `DuplicateIdentity` if the id is taken.
    pub async fn create(&self, mut patient: Patient) -> Result<Patient, PatientError> {
        patient.validate()?;
        patient.meta = Some(generate_meta());

        let doc = prepare_for_storage(patient);
        self.repo.insert(&doc).await?;

        tracing::info!(patient_id = %doc.id(), version = ?version_of(&doc.patient), "Patient created");
        Ok(doc.into_patient())
    }

    pub async fn read(&self, id: &str) -> Result<Patient, PatientError> {
        self.repo
            .get(id)
            .await?
            .map(|doc| doc.into_patient())
            .ok_or_else(|| PatientError::NotFound(id.to_string()))
    }

    /// Replace a patient. The path id wins over any id in the body.
    pub async fn update(&self, id: &str, mut patient: Patient) -> Result<Patient, PatientError> {
        patient.id = id.to_string();
        patient.validate()?;
        patient.meta = Some(generate_meta());

        let doc = prepare_for_storage(patient);
        if self.repo.replace(id, &doc).await? == 0 {
            return Err(PatientError::NotFound(id.to_string()));
        }

        tracing::info!(patient_id = %id, version = ?version_of(&doc.patient), "Patient replaced");
        Ok(doc.into_patient())
    }

    /// Apply a constrained patch.
    ///
    /// The current document is re-read so derived fields are recomputed
    /// from the merged resource, then only the touched fields, `meta` and
    /// the derived fields of those touched fields are sent to the store.
    pub async fn patch(&self, id: &str, patch: PatientPatch) -> Result<Patient, PatientError> {
        let current = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| PatientError::NotFound(id.to_string()))?;

        let mut patient = current.into_patient();
        patch.apply(&mut patient);
        patient.meta = Some(generate_meta());

        let doc = prepare_for_storage(patient);
        let fields = patch.storage_fields(&doc)?;

        if self.repo.partial_update(id, fields).await? == 0 {
            return Err(PatientError::NotFound(id.to_string()));
        }

        tracing::info!(
            patient_id = %id,
            fields = ?patch.fields(),
            version = ?version_of(&doc.patient),
            "Patient patched"
        );
        Ok(doc.into_patient())
    }

    pub async fn delete(&self, id: &str) -> Result<(), PatientError> {
        if self.repo.delete(id).await? == 0 {
            return Err(PatientError::NotFound(id.to_string()));
        }

        tracing::info!(patient_id = %id, "Patient deleted");
        Ok(())
    }

    /// Search patients. Zero matches is an empty vec, not an error.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Patient>, PatientError> {
        let query = params.to_query();
        tracing::debug!(predicate = %query.predicate, limit = query.limit, offset = query.offset, "Searching patients");

        let docs = self.repo.find(&query).await?;
        Ok(docs.into_iter().map(|doc| doc.into_patient()).collect())
    }

    pub async fn ping(&self) -> Result<(), PatientError> {
        self.repo.ping().await
    }
}

fn version_of(patient: &Patient) -> Option<&str> {
    patient.meta.as_ref().map(|m| m.version_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryRepository;
    use async_trait::async_trait;
    use patient_core::{HumanName, Identifier, PatientQuery, StorageDocument};
    use serde_json::{Map, Value as JsonValue, json};
    use tokio::sync::Barrier;

    fn service() -> (PatientService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        (PatientService::new(repo.clone()), repo)
    }

    fn lee() -> Patient {
        let mut patient = Patient::new(vec![HumanName::official("Lee", &["Ann"])], "female", "1990-04-12");
        patient.identifiers = vec![
            Identifier::new("urn:hospital", "MRN", "123"),
            Identifier::new("urn:passport", "PASSPORT", "X9"),
        ];
        patient
    }

    #[tokio::test]
    async fn create_stamps_meta_and_assigns_id() {
        let (service, _) = service();
        let mut patient = lee();
        patient.meta = Some(patient_core::Meta {
            version_id: "caller".into(),
            last_updated: "never".into(),
            source: "urn:uuid:caller".into(),
        });

        let created = service.create(patient).await.unwrap();
        assert!(!created.id.is_empty());
        let meta = created.meta.unwrap();
        assert_ne!(meta.version_id, "caller");
        assert_ne!(meta.source, "urn:uuid:caller");
    }

    #[tokio::test]
    async fn duplicate_create_leaves_store_unchanged() {
        let (service, repo) = service();
        let mut first = lee();
        first.id = "p1".into();
        service.create(first).await.unwrap();

        let mut second = lee();
        second.id = "p1".into();
        second.gender = "male".into();
        let err = service.create(second).await.unwrap_err();

        assert!(matches!(err, PatientError::DuplicateIdentity(_)));
        assert_eq!(service.read("p1").await.unwrap().gender, "female");
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_regenerates_meta_and_derived_fields() {
        let (service, repo) = service();
        let created = service.create(lee()).await.unwrap();

        let mut replacement = lee();
        replacement.name = vec![HumanName::official("Park", &["Jin"])];
        replacement.identifiers = vec![];
        let updated = service.update(&created.id, replacement).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_ne!(updated.meta, created.meta);

        let stored = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.denormalized.name_0_family.as_deref(), Some("Park"));
        assert_eq!(stored.lookup.mrn, None);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (service, repo) = service();
        let err = service.update("ghost", lee()).await.unwrap_err();
        assert!(matches!(err, PatientError::NotFound(id) if id == "ghost"));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn patch_keeps_derived_fields_in_sync() {
        let (service, repo) = service();
        let created = service.create(lee()).await.unwrap();

        let patch = PatientPatch::from_json(json!({
            "name": [{"use": "official", "family": "Kim", "given": []}],
            "identifiers": [{"system": "urn:hospital", "value": "999", "type": "MRN"}]
        }))
        .unwrap();
        let patched = service.patch(&created.id, patch).await.unwrap();
        assert_eq!(patched.name[0].family, "Kim");
        assert_ne!(patched.meta, created.meta);

        let stored = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.denormalized.name_0_family.as_deref(), Some("Kim"));
        assert_eq!(stored.denormalized.name_0_given, None);
        assert_eq!(stored.lookup.mrn.as_deref(), Some("999"));
        assert_eq!(stored.lookup.identifier_passport, None);
        assert_eq!(stored.patient.gender, "female");
    }

    #[tokio::test]
    async fn delete_missing_is_not_found_and_store_unchanged() {
        let (service, repo) = service();
        service.create(lee()).await.unwrap();

        let err = service.delete("ghost").await.unwrap_err();
        assert!(matches!(err, PatientError::NotFound(_)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn search_with_name_and_identifier_requires_both() {
        let (service, _) = service();
        service.create(lee()).await.unwrap();

        let mut other = lee();
        other.identifiers = vec![Identifier::new("urn:hospital", "MRN", "456")];
        service.create(other).await.unwrap();

        let mut kim = lee();
        kim.name = vec![HumanName::official("Kim", &["Bo"])];
        service.create(kim).await.unwrap();

        let params = SearchParams {
            name: Some("lee".into()),
            identifier: Some("123".into()),
            ..Default::default()
        };
        let hits = service.search(&params).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].identifiers[0].value, "123");

        let none = SearchParams {
            name: Some("nobody".into()),
            ..Default::default()
        };
        assert!(service.search(&none).await.unwrap().is_empty());
    }

    /// Holds each `get` until two readers have arrived, so both patches
    /// work from the same snapshot.
    struct SharedSnapshot {
        inner: InMemoryRepository,
        readers: Barrier,
    }

    #[async_trait]
    impl PatientRepository for SharedSnapshot {
        async fn ensure_indexes(&self) -> Result<(), PatientError> {
            self.inner.ensure_indexes().await
        }

        async fn insert(&self, doc: &StorageDocument) -> Result<(), PatientError> {
            self.inner.insert(doc).await
        }

        async fn get(&self, id: &str) -> Result<Option<StorageDocument>, PatientError> {
            let doc = self.inner.get(id).await;
            self.readers.wait().await;
            doc
        }

        async fn replace(&self, id: &str, doc: &StorageDocument) -> Result<u64, PatientError> {
            self.inner.replace(id, doc).await
        }

        async fn partial_update(
            &self,
            id: &str,
            fields: Map<String, JsonValue>,
        ) -> Result<u64, PatientError> {
            self.inner.partial_update(id, fields).await
        }

        async fn delete(&self, id: &str) -> Result<u64, PatientError> {
            self.inner.delete(id).await
        }

        async fn find(&self, query: &PatientQuery) -> Result<Vec<StorageDocument>, PatientError> {
            self.inner.find(query).await
        }

        async fn ping(&self) -> Result<(), PatientError> {
            self.inner.ping().await
        }

        fn backend_name(&self) -> &'static str {
            "shared-snapshot"
        }
    }

    #[tokio::test]
    async fn concurrent_patches_of_different_fields_keep_lookups_in_sync() {
        let repo = Arc::new(SharedSnapshot {
            inner: InMemoryRepository::new(),
            readers: Barrier::new(2),
        });
        let service = PatientService::new(repo.clone());
        let created = service.create(lee()).await.unwrap();

        let rename = PatientPatch::from_json(json!({
            "name": [{"use": "official", "family": "Park", "given": ["Jin"]}]
        }))
        .unwrap();
        let renumber = PatientPatch::from_json(json!({
            "identifiers": [{"system": "urn:hospital", "value": "999", "type": "MRN"}]
        }))
        .unwrap();

        let (renamed, renumbered) = tokio::join!(
            service.patch(&created.id, rename),
            service.patch(&created.id, renumber)
        );
        renamed.unwrap();
        renumbered.unwrap();

        let stored = repo.inner.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.patient.name[0].family, "Park");
        assert_eq!(stored.denormalized.name_0_family.as_deref(), Some("Park"));
        assert_eq!(stored.denormalized.name_0_given.as_deref(), Some("Jin"));
        assert_eq!(stored.patient.identifiers[0].value, "999");
        assert_eq!(stored.lookup.mrn.as_deref(), Some("999"));
        assert_eq!(stored.lookup.identifier_passport, None);

        let by_new_mrn = SearchParams {
            identifier: Some("999".into()),
            ..Default::default()
        };
        assert_eq!(service.search(&by_new_mrn).await.unwrap().len(), 1);

        let by_old_mrn = SearchParams {
            identifier: Some("123".into()),
            ..Default::default()
        };
        assert!(service.search(&by_old_mrn).await.unwrap().is_empty());
    }
}
