use std::sync::Arc;

use log::{debug, info, warn};

use crate::models::{QrPayload, VerificationResult};
use crate::services::{KeyRegistryClient, KeyRegistryError};
use crate::utils::crypto::{hash_document, verify_hash_base64, PublicKey, SignerContext, SigningAlgorithm};
use crate::utils::qr_payload::{build_payload, decode_payload, encode_payload, PayloadError};

/// Decode, check the signature against `public_key`, then recompute the hash.
///
/// `public_key` is `Err` when the caller's key could not be parsed; that is
/// reported as a signature failure once the payload itself has decoded.
fn verify_payload(
    encoded_payload: &str,
    document: &[u8],
    public_key: Result<&PublicKey, String>,
) -> VerificationResult {
    let payload = match decode_payload(encoded_payload) {
        Ok(payload) => payload,
        Err(e) => return VerificationResult::payload_corrupted(e.to_string()),
    };

    let public_key = match public_key {
        Ok(key) => key,
        Err(message) => return VerificationResult::invalid_signature(message),
    };

    match verify_hash_base64(&payload.doc_hash, &payload.signature, public_key) {
        Ok(true) => {}
        Ok(false) => return VerificationResult::invalid_signature("Signature does not match the document hash"),
        Err(e) => return VerificationResult::invalid_signature(e.to_string()),
    }

    // Other encoders may emit uppercase hex.
    if !hash_document(document).eq_ignore_ascii_case(&payload.doc_hash) {
        return VerificationResult::hash_mismatch(&payload);
    }

    VerificationResult::valid(&payload)
}

/// Hashing, payload sealing and verification on top of the service's signing key.
pub struct IntegrityService {
    signer: Arc<SignerContext>,
    key_registry: Option<KeyRegistryClient>,
}

impl IntegrityService {
    pub fn new(signer: Arc<SignerContext>, key_registry: Option<KeyRegistryClient>) -> Self {
        Self { signer, key_registry }
    }

    pub fn hash(&self, document: &[u8]) -> String {
        hash_document(document)
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.signer.algorithm()
    }

    pub fn public_key(&self) -> &str {
        self.signer.encoded_public_key()
    }

    pub fn build_payload(&self, doc_hash: &str, signer_id: &str, doc_id: &str) -> Result<QrPayload, PayloadError> {
        build_payload(&self.signer, doc_hash, signer_id, doc_id)
    }

    /// Hash, build and encode in one step. Returns the payload and its QR string.
    pub fn seal_document(
        &self,
        document: &[u8],
        signer_id: &str,
        doc_id: &str,
    ) -> Result<(QrPayload, String), PayloadError> {
        let doc_hash = self.hash(document);
        let payload = self.build_payload(&doc_hash, signer_id, doc_id)?;
        let encoded = encode_payload(&payload)?;
        info!("Sealed document {} for signer {} (hash {})", doc_id, signer_id, doc_hash);
        Ok((payload, encoded))
    }

    pub fn verify_document(&self, encoded_payload: &str, document: &[u8]) -> VerificationResult {
        let result = verify_payload(encoded_payload, document, Ok(self.signer.public_key()));
        log_verdict("online", &result);
        result
    }

    pub fn verify_document_offline(
        &self,
        encoded_payload: &str,
        document: &[u8],
        external_public_key: &str,
    ) -> VerificationResult {
        let parsed = PublicKey::from_base64(external_public_key);
        if let Ok(key) = &parsed {
            debug!("Offline verification with caller-supplied {} key", key.algorithm());
        }
        let public_key = parsed
            .as_ref()
            .map_err(|e| format!("Invalid verification key: {}", e));
        let result = verify_payload(encoded_payload, document, public_key);
        log_verdict("offline", &result);
        result
    }

    /// Offline verification with a key looked up in the external registry.
    /// Registry failures are hard errors, not verdicts.
    pub async fn verify_document_with_registry_key(
        &self,
        encoded_payload: &str,
        document: &[u8],
        key_id: &str,
    ) -> Result<VerificationResult, KeyRegistryError> {
        let registry = self.key_registry.as_ref().ok_or(KeyRegistryError::NotConfigured)?;
        let public_key = registry.fetch_public_key(key_id).await?;
        Ok(self.verify_document_offline(encoded_payload, document, &public_key))
    }
}

fn log_verdict(mode: &str, result: &VerificationResult) {
    if result.is_valid() {
        info!("{} verification of {:?} succeeded", mode, result.doc_id);
    } else {
        warn!(
            "{} verification returned {:?}: {}",
            mode,
            result.status,
            result.error_message.as_deref().unwrap_or("")
        );
    }
}
