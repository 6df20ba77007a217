use serde::{Deserialize, Serialize};

pub const PAYLOAD_VERSION: u32 = 1;

/// Self-contained proof embedded in a document's QR code.
///
/// Field order here is the canonical wire order and must not change:
/// `{"v","doc_hash","sig","uid","ts","doc_id"}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct QrPayload {
    #[serde(rename = "v")]
    pub version: u32,
    pub doc_hash: String,
    #[serde(rename = "sig")]
    pub signature: String,
    #[serde(rename = "uid")]
    pub signer_id: String,
    #[serde(rename = "ts")]
    pub timestamp_millis: i64,
    pub doc_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HashDocumentRequest {
    pub document_base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HashDocumentResponse {
    pub doc_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SealDocumentRequest {
    pub document_base64: String,
    pub signer_id: String,
    pub doc_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SealDocumentResponse {
    pub doc_hash: String,
    pub payload: QrPayload,
    /// QR-ready transport string.
    pub encoded: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub algorithm: String,
    pub public_key: String,
}
