use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};

use crate::models::{
    RequestSignatureRequest, SignatureError, SignatureRecord, SignatureStatus, Transition,
    UpdateSignatureRequest,
};
use crate::traits::SignatureStore;

/// Signature request lifecycle: request, sign, reject, reset.
///
/// Status changes go through the store's conditional write, so concurrent
/// calls on one record cannot both succeed.
pub struct SignatureService {
    store: Arc<dyn SignatureStore>,
}

impl SignatureService {
    pub fn new(store: Arc<dyn SignatureStore>) -> Self {
        Self { store }
    }

    pub async fn request_signature(&self, request: RequestSignatureRequest) -> Result<SignatureRecord, SignatureError> {
        if request.document_id.trim().is_empty() {
            return Err(SignatureError::Validation("Document ID cannot be empty".to_string()));
        }
        if request.signer_id.trim().is_empty() {
            return Err(SignatureError::Validation("Signer ID cannot be empty".to_string()));
        }

        if self.store
            .get_by_document_and_signer(&request.document_id, &request.signer_id)
            .await?
            .is_some()
        {
            return Err(SignatureError::DuplicateSignature {
                document_id: request.document_id,
                signer_id: request.signer_id,
            });
        }

        // The store's uniqueness check catches requests racing past the lookup above.
        let record = SignatureRecord::new(request.document_id, request.signer_id, request.metadata);
        let created = self.store.create(record).await?;
        info!(
            "Requested signature {} from {} on document {}",
            created.id, created.signer_id, created.document_id
        );
        Ok(created)
    }

    pub async fn get_signature(&self, signature_id: &str) -> Result<SignatureRecord, SignatureError> {
        self.store
            .get_by_id(signature_id)
            .await?
            .ok_or_else(|| SignatureError::NotFound { signature_id: signature_id.to_string() })
    }

    pub async fn get_document_signatures(&self, document_id: &str) -> Result<Vec<SignatureRecord>, SignatureError> {
        Ok(self.store.get_by_document(document_id).await?)
    }

    pub async fn list_by_status(&self, status: SignatureStatus) -> Result<Vec<SignatureRecord>, SignatureError> {
        Ok(self.store.list_by_status(status).await?)
    }

    pub async fn sign(&self, signature_id: &str, signature_blob: String) -> Result<SignatureRecord, SignatureError> {
        if signature_blob.trim().is_empty() {
            return Err(SignatureError::Validation("Signature blob cannot be empty".to_string()));
        }
        self.apply_transition(signature_id, Transition::Sign { signature_blob }).await
    }

    pub async fn reject(&self, signature_id: &str, reason: String) -> Result<SignatureRecord, SignatureError> {
        self.apply_transition(signature_id, Transition::Reject { reason }).await
    }

    pub async fn reset(&self, signature_id: &str) -> Result<SignatureRecord, SignatureError> {
        self.apply_transition(signature_id, Transition::Reset).await
    }

    /// Administrative edit of signer details. Never changes status.
    pub async fn update_metadata(
        &self,
        signature_id: &str,
        update: UpdateSignatureRequest,
    ) -> Result<SignatureRecord, SignatureError> {
        let mut record = self.get_signature(signature_id).await?;

        if let Some(signer_name) = update.signer_name {
            record.signer_name = signer_name;
        }
        if let Some(signer_email) = update.signer_email {
            record.signer_email = signer_email;
        }
        if let Some(signer_role) = update.signer_role {
            record.signer_role = signer_role;
        }
        if let Some(signature_type) = update.signature_type {
            record.signature_type = signature_type;
        }
        record.updated_at = Utc::now();

        self.store
            .update(&record)
            .await?
            .ok_or_else(|| SignatureError::NotFound { signature_id: signature_id.to_string() })
    }

    /// Administrative soft delete; frees the (document, signer) pair.
    pub async fn delete_signature(&self, signature_id: &str) -> Result<(), SignatureError> {
        if self.store.soft_delete(signature_id, Utc::now()).await? {
            info!("Soft-deleted signature {}", signature_id);
            Ok(())
        } else {
            Err(SignatureError::NotFound { signature_id: signature_id.to_string() })
        }
    }

    async fn apply_transition(
        &self,
        signature_id: &str,
        transition: Transition,
    ) -> Result<SignatureRecord, SignatureError> {
        if let Some(updated) = self.store.transition(signature_id, &transition, Utc::now()).await? {
            info!("Signature {} is now {}", signature_id, updated.status);
            return Ok(updated);
        }

        // The conditional write missed: work out why from the current state.
        let current = self.get_signature(signature_id).await?;
        let err = rejected_transition(&transition, &current);
        warn!("Refused to {} signature {}: {}", transition.name(), signature_id, err);
        Err(err)
    }
}

fn rejected_transition(transition: &Transition, current: &SignatureRecord) -> SignatureError {
    let signature_id = current.id.clone();
    match (transition, current.status) {
        (Transition::Sign { .. } | Transition::Reject { .. }, SignatureStatus::Signed) => {
            SignatureError::AlreadySigned { signature_id }
        }
        (Transition::Sign { .. }, SignatureStatus::Rejected) => SignatureError::SignatureRejected { signature_id },
        (_, status) => SignatureError::InvalidTransition {
            signature_id,
            operation: transition.name(),
            status,
        },
    }
}
