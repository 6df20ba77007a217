use serde::{Deserialize, Serialize};
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;
use std::fmt;

use crate::models::SignatureStatus;
use crate::services::KeyRegistryError;
use crate::utils::qr_payload::PayloadError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Errors raised by the document hashing, sealing and verification endpoints.
#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),
    SigningError(String),
    KeyRegistry(KeyRegistryError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::SigningError(msg) => write!(f, "Signing error: {}", msg),
            ApiError::KeyRegistry(e) => write!(f, "Key registry error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        ApiError::SigningError(err.to_string())
    }
}

impl From<KeyRegistryError> for ApiError {
    fn from(err: KeyRegistryError) -> Self {
        ApiError::KeyRegistry(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::SigningError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::KeyRegistry(e) => e.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::ValidationError(_) => {
                HttpResponse::BadRequest().json(ErrorResponse {
                    code: "VALIDATION_ERROR".to_string(),
                    message: self.to_string(),
                    details: None,
                })
            }
            ApiError::SigningError(_) => {
                HttpResponse::InternalServerError().json(ErrorResponse {
                    code: "SIGNING_ERROR".to_string(),
                    message: "Internal server error".to_string(),
                    details: None,
                })
            }
            ApiError::KeyRegistry(e) => e.error_response(),
        }
    }
}

/// Failures of the signature store. Surfaced to callers as-is, never retried.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate record for document {document_id} and signer {signer_id}")]
    Duplicate { document_id: String, signer_id: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Signature {signature_id} not found")]
    NotFound { signature_id: String },

    #[error("Document {document_id} already has a signature request for signer {signer_id}")]
    DuplicateSignature { document_id: String, signer_id: String },

    #[error("Signature {signature_id} is already signed")]
    AlreadySigned { signature_id: String },

    #[error("Signature {signature_id} was rejected and must be reset before signing")]
    SignatureRejected { signature_id: String },

    #[error("Cannot {operation} signature {signature_id} while it is {status}")]
    InvalidTransition {
        signature_id: String,
        operation: &'static str,
        status: SignatureStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl SignatureError {
    fn code(&self) -> &'static str {
        match self {
            SignatureError::NotFound { .. } => "NOT_FOUND",
            SignatureError::DuplicateSignature { .. } => "DUPLICATE_SIGNATURE",
            SignatureError::AlreadySigned { .. } => "ALREADY_SIGNED",
            SignatureError::SignatureRejected { .. } => "SIGNATURE_REJECTED",
            SignatureError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SignatureError::Validation(_) => "VALIDATION_ERROR",
            SignatureError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<StorageError> for SignatureError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { document_id, signer_id } => {
                SignatureError::DuplicateSignature { document_id, signer_id }
            }
            other => SignatureError::Storage(other),
        }
    }
}

impl ResponseError for SignatureError {
    fn status_code(&self) -> StatusCode {
        match self {
            SignatureError::NotFound { .. } => StatusCode::NOT_FOUND,
            SignatureError::DuplicateSignature { .. }
            | SignatureError::AlreadySigned { .. }
            | SignatureError::SignatureRejected { .. }
            | SignatureError::InvalidTransition { .. } => StatusCode::CONFLICT,
            SignatureError::Validation(_) => StatusCode::BAD_REQUEST,
            SignatureError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            details: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_storage_error_maps_to_duplicate_signature() {
        let err: SignatureError = StorageError::Duplicate {
            document_id: "doc1".to_string(),
            signer_id: "u1".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            SignatureError::DuplicateSignature { ref document_id, ref signer_id }
                if document_id == "doc1" && signer_id == "u1"
        ));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_errors_pass_through() {
        let err: SignatureError = StorageError::Unavailable("lock poisoned".to_string()).into();
        assert_eq!(err.to_string(), "Storage unavailable: lock poisoned");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_payload_errors_map_to_signing_error() {
        let err = ApiError::from(PayloadError::UnsupportedVersion(2));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Signing error: Unsupported payload version: 2");
        assert_eq!(err.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_transition_error_message() {
        let err = SignatureError::InvalidTransition {
            signature_id: "sig-1".to_string(),
            operation: "reset",
            status: SignatureStatus::Pending,
        };
        assert_eq!(err.to_string(), "Cannot reset signature sig-1 while it is Pending");
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }
}
