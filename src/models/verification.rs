use serde::{Deserialize, Serialize};

use crate::models::QrPayload;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Valid,
    InvalidSignature,
    HashMismatch,
    PayloadCorrupted,
}

/// Integrity verdict for a document checked against its QR payload.
/// Failures are values, not errors, so callers can always show a status.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VerificationResult {
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_millis: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl VerificationResult {
    pub fn valid(payload: &QrPayload) -> Self {
        Self {
            status: VerificationStatus::Valid,
            signer_id: Some(payload.signer_id.clone()),
            timestamp_millis: Some(payload.timestamp_millis),
            doc_id: Some(payload.doc_id.clone()),
            error_message: None,
        }
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::InvalidSignature,
            signer_id: None,
            timestamp_millis: None,
            doc_id: None,
            error_message: Some(message.into()),
        }
    }

    /// The signature was genuine, so the document id is kept for the audit trail.
    pub fn hash_mismatch(payload: &QrPayload) -> Self {
        Self {
            status: VerificationStatus::HashMismatch,
            signer_id: None,
            timestamp_millis: None,
            doc_id: Some(payload.doc_id.clone()),
            error_message: Some("Document content does not match the signed hash".to_string()),
        }
    }

    pub fn payload_corrupted(message: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::PayloadCorrupted,
            signer_id: None,
            timestamp_millis: None,
            doc_id: None,
            error_message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == VerificationStatus::Valid
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyDocumentRequest {
    pub payload: String,
    pub document_base64: String,
}

/// Offline verification names its key either inline or by registry id.
#[derive(Debug, Serialize, Deserialize)]
pub struct OfflineVerifyRequest {
    pub payload: String,
    pub document_base64: String,
    pub public_key: Option<String>,
    pub key_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let result = VerificationResult::payload_corrupted("bad base64");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "PAYLOAD_CORRUPTED");
        assert!(json.get("doc_id").is_none());

        assert_eq!(
            serde_json::to_value(VerificationStatus::InvalidSignature).unwrap(),
            "INVALID_SIGNATURE"
        );
    }
}
