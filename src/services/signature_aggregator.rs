use std::sync::Arc;

use crate::models::{DocumentApprovalResponse, SignatureError, SignatureStats};
use crate::traits::SignatureStore;

/// Read-only rollup of a document's signature records.
pub struct SignatureAggregator {
    store: Arc<dyn SignatureStore>,
}

impl SignatureAggregator {
    pub fn new(store: Arc<dyn SignatureStore>) -> Self {
        Self { store }
    }

    pub async fn stats(&self, document_id: &str) -> Result<SignatureStats, SignatureError> {
        let records = self.store.get_by_document(document_id).await?;
        Ok(SignatureStats::from_records(&records))
    }

    /// Stats plus the approval verdict, from a single read of the store.
    pub async fn approval(&self, document_id: &str) -> Result<DocumentApprovalResponse, SignatureError> {
        let stats = self.stats(document_id).await?;
        Ok(DocumentApprovalResponse {
            document_id: document_id.to_string(),
            fully_approved: stats.is_fully_approved(),
            stats,
        })
    }

    /// True once every live signer has signed. A document with no signers is not approved.
    pub async fn is_fully_approved(&self, document_id: &str) -> Result<bool, SignatureError> {
        Ok(self.approval(document_id).await?.fully_approved)
    }
}
