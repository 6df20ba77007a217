use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{SignatureRecord, SignatureStatus, StorageError, Transition};
use crate::utils::crypto::{CryptoError, PublicKey, SigningAlgorithm};

/// Private key material able to sign on behalf of the service.
pub trait KeyPair: Send + Sync {
    fn algorithm(&self) -> SigningAlgorithm;
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn public_key(&self) -> PublicKey;
}

/// Persistence contract for signature records.
///
/// Every read skips soft-deleted records. `transition` is the only way the
/// workflow changes a record's status: implementations must apply it as a
/// single conditional write that matches on the id, on one of the
/// transition's allowed source states and on the record not being deleted.
/// `Ok(None)` means the condition did not hold.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    async fn create(&self, record: SignatureRecord) -> Result<SignatureRecord, StorageError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<SignatureRecord>, StorageError>;

    async fn get_by_document(&self, document_id: &str) -> Result<Vec<SignatureRecord>, StorageError>;

    async fn get_by_document_and_signer(
        &self,
        document_id: &str,
        signer_id: &str,
    ) -> Result<Option<SignatureRecord>, StorageError>;

    async fn list_by_status(&self, status: SignatureStatus) -> Result<Vec<SignatureRecord>, StorageError>;

    /// Writes the signer metadata fields of `record` (name, email, role,
    /// signature type) and its `updated_at`. Status fields are left alone.
    async fn update(&self, record: &SignatureRecord) -> Result<Option<SignatureRecord>, StorageError>;

    async fn soft_delete(&self, id: &str, deleted_at: DateTime<Utc>) -> Result<bool, StorageError>;

    async fn transition(
        &self,
        id: &str,
        transition: &Transition,
        now: DateTime<Utc>,
    ) -> Result<Option<SignatureRecord>, StorageError>;
}
