use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use thiserror::Error;

use crate::models::{QrPayload, PAYLOAD_VERSION};
use crate::utils::crypto::{CryptoError, SignerContext};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Payload structure is invalid: {0}")]
    Structure(#[from] serde_json::Error),

    #[error("Unsupported payload version: {0}")]
    UnsupportedVersion(u32),

    #[error("Failed to sign payload: {0}")]
    Signing(#[from] CryptoError),
}

/// Signs `doc_hash` with the service key and stamps the current time.
pub fn build_payload(
    signer: &SignerContext,
    doc_hash: &str,
    signer_id: &str,
    doc_id: &str,
) -> Result<QrPayload, PayloadError> {
    let signature = signer.sign_hash(doc_hash)?;
    Ok(QrPayload {
        version: PAYLOAD_VERSION,
        doc_hash: doc_hash.to_string(),
        signature: BASE64.encode(signature),
        signer_id: signer_id.to_string(),
        timestamp_millis: Utc::now().timestamp_millis(),
        doc_id: doc_id.to_string(),
    })
}

/// Canonical JSON in wire field order, then standard base64.
pub fn encode_payload(payload: &QrPayload) -> Result<String, PayloadError> {
    let json = serde_json::to_vec(payload)?;
    Ok(BASE64.encode(json))
}

pub fn decode_payload(encoded: &str) -> Result<QrPayload, PayloadError> {
    let json = BASE64.decode(encoded.trim())?;
    let payload: QrPayload = serde_json::from_slice(&json)?;
    if payload.version != PAYLOAD_VERSION {
        return Err(PayloadError::UnsupportedVersion(payload.version));
    }
    Ok(payload)
}
