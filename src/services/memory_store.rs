use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{SignatureRecord, SignatureStatus, StorageError, Transition};
use crate::traits::SignatureStore;

/// Process-local signature store for development runs and tests.
///
/// Holds the same guarantees as the MongoDB store: one live record per
/// (document, signer) and transitions applied under a single lock.
#[derive(Default)]
pub struct InMemorySignatureStore {
    records: Mutex<HashMap<String, SignatureRecord>>,
}

impl InMemorySignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SignatureRecord>>, StorageError> {
        self.records
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("signature store lock poisoned: {}", e)))
    }

    fn collect_sorted<F>(&self, predicate: F) -> Result<Vec<SignatureRecord>, StorageError>
    where
        F: Fn(&SignatureRecord) -> bool,
    {
        let records = self.lock()?;
        let mut matching: Vec<SignatureRecord> = records
            .values()
            .filter(|r| r.deleted_at.is_none() && predicate(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[async_trait]
impl SignatureStore for InMemorySignatureStore {
    async fn create(&self, record: SignatureRecord) -> Result<SignatureRecord, StorageError> {
        let mut records = self.lock()?;
        let duplicate = records.values().any(|r| {
            r.deleted_at.is_none() && r.document_id == record.document_id && r.signer_id == record.signer_id
        });
        if duplicate {
            return Err(StorageError::Duplicate {
                document_id: record.document_id.clone(),
                signer_id: record.signer_id.clone(),
            });
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<SignatureRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records.get(id).filter(|r| r.deleted_at.is_none()).cloned())
    }

    async fn get_by_document(&self, document_id: &str) -> Result<Vec<SignatureRecord>, StorageError> {
        self.collect_sorted(|r| r.document_id == document_id)
    }

    async fn get_by_document_and_signer(
        &self,
        document_id: &str,
        signer_id: &str,
    ) -> Result<Option<SignatureRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records
            .values()
            .find(|r| r.deleted_at.is_none() && r.document_id == document_id && r.signer_id == signer_id)
            .cloned())
    }

    async fn list_by_status(&self, status: SignatureStatus) -> Result<Vec<SignatureRecord>, StorageError> {
        self.collect_sorted(|r| r.status == status)
    }

    async fn update(&self, record: &SignatureRecord) -> Result<Option<SignatureRecord>, StorageError> {
        let mut records = self.lock()?;
        match records.get_mut(&record.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.signer_name = record.signer_name.clone();
                existing.signer_email = record.signer_email.clone();
                existing.signer_role = record.signer_role.clone();
                existing.signature_type = record.signature_type.clone();
                existing.updated_at = record.updated_at;
                Ok(Some(existing.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn soft_delete(&self, id: &str, deleted_at: DateTime<Utc>) -> Result<bool, StorageError> {
        let mut records = self.lock()?;
        match records.get_mut(id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.deleted_at = Some(deleted_at);
                existing.updated_at = deleted_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transition(
        &self,
        id: &str,
        transition: &Transition,
        now: DateTime<Utc>,
    ) -> Result<Option<SignatureRecord>, StorageError> {
        let mut records = self.lock()?;
        match records.get_mut(id) {
            Some(existing) if existing.deleted_at.is_none() && transition.is_allowed_from(existing.status) => {
                transition.apply(existing, now);
                Ok(Some(existing.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignerMetadata;

    fn record(document_id: &str, signer_id: &str) -> SignatureRecord {
        SignatureRecord::new(
            document_id.to_string(),
            signer_id.to_string(),
            SignerMetadata {
                signer_name: format!("Signer {}", signer_id),
                signer_email: format!("{}@example.com", signer_id),
                signer_role: "reviewer".to_string(),
                signature_type: "electronic".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_unique_per_document_and_signer() {
        let store = InMemorySignatureStore::new();
        store.create(record("doc1", "u1")).await.unwrap();
        store.create(record("doc1", "u2")).await.unwrap();
        store.create(record("doc2", "u1")).await.unwrap();

        let err = store.create(record("doc1", "u1")).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_record_and_frees_pair() {
        let store = InMemorySignatureStore::new();
        let created = store.create(record("doc1", "u1")).await.unwrap();

        assert!(store.soft_delete(&created.id, Utc::now()).await.unwrap());
        assert!(!store.soft_delete(&created.id, Utc::now()).await.unwrap());
        assert!(store.get_by_id(&created.id).await.unwrap().is_none());
        assert!(store.get_by_document("doc1").await.unwrap().is_empty());

        store.create(record("doc1", "u1")).await.unwrap();
        assert_eq!(store.get_by_document("doc1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let store = InMemorySignatureStore::new();
        let created = store.create(record("doc1", "u1")).await.unwrap();
        let sign = Transition::Sign { signature_blob: "blob".to_string() };

        let signed = store.transition(&created.id, &sign, Utc::now()).await.unwrap().unwrap();
        assert_eq!(signed.status, SignatureStatus::Signed);

        assert!(store.transition(&created.id, &sign, Utc::now()).await.unwrap().is_none());
        assert!(store.transition("missing", &sign, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_only_touches_metadata() {
        let store = InMemorySignatureStore::new();
        let created = store.create(record("doc1", "u1")).await.unwrap();

        let mut changed = created.clone();
        changed.signer_role = "approver".to_string();
        changed.status = SignatureStatus::Signed;
        let updated = store.update(&changed).await.unwrap().unwrap();

        assert_eq!(updated.signer_role, "approver");
        assert_eq!(updated.status, SignatureStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = InMemorySignatureStore::new();
        let first = store.create(record("doc1", "u1")).await.unwrap();
        store.create(record("doc1", "u2")).await.unwrap();
        store
            .transition(&first.id, &Transition::Reject { reason: "wrong totals".to_string() }, Utc::now())
            .await
            .unwrap();

        assert_eq!(store.list_by_status(SignatureStatus::Pending).await.unwrap().len(), 1);
        let rejected = store.list_by_status(SignatureStatus::Rejected).await.unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].notes.as_deref(), Some("wrong totals"));
    }
}
