use actix_web::{web, HttpResponse};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::{info, error};

use crate::models::{
    ApiError, HashDocumentRequest, HashDocumentResponse, OfflineVerifyRequest, PublicKeyResponse,
    SealDocumentRequest, SealDocumentResponse, VerifyDocumentRequest,
};
use crate::services::IntegrityService;

fn decode_document(document_base64: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(document_base64.trim())
        .map_err(|e| ApiError::ValidationError(format!("Document is not valid base64: {}", e)))
}

pub async fn get_public_key(integrity: web::Data<IntegrityService>) -> HttpResponse {
    HttpResponse::Ok().json(PublicKeyResponse {
        algorithm: integrity.algorithm().to_string(),
        public_key: integrity.public_key().to_string(),
    })
}

pub async fn hash_document(
    integrity: web::Data<IntegrityService>,
    request: web::Json<HashDocumentRequest>,
) -> Result<HttpResponse, ApiError> {
    let document = decode_document(&request.document_base64)?;
    Ok(HttpResponse::Ok().json(HashDocumentResponse {
        doc_hash: integrity.hash(&document),
    }))
}

pub async fn seal_document(
    integrity: web::Data<IntegrityService>,
    request: web::Json<SealDocumentRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Sealing document {} for signer {}", request.doc_id, request.signer_id);

    if request.signer_id.trim().is_empty() || request.doc_id.trim().is_empty() {
        return Err(ApiError::ValidationError("signer_id and doc_id are required".to_string()));
    }
    let document = decode_document(&request.document_base64)?;

    let (payload, encoded) = integrity
        .seal_document(&document, &request.signer_id, &request.doc_id)
        .map_err(|e| {
            error!("Failed to seal document {}: {}", request.doc_id, e);
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Created().json(SealDocumentResponse {
        doc_hash: payload.doc_hash.clone(),
        payload,
        encoded,
    }))
}

pub async fn verify_document(
    integrity: web::Data<IntegrityService>,
    request: web::Json<VerifyDocumentRequest>,
) -> Result<HttpResponse, ApiError> {
    let document = decode_document(&request.document_base64)?;
    let result = integrity.verify_document(&request.payload, &document);
    Ok(HttpResponse::Ok().json(result))
}

pub async fn verify_document_offline(
    integrity: web::Data<IntegrityService>,
    request: web::Json<OfflineVerifyRequest>,
) -> Result<HttpResponse, ApiError> {
    let document = decode_document(&request.document_base64)?;

    let result = match (&request.public_key, &request.key_id) {
        (Some(public_key), None) => integrity.verify_document_offline(&request.payload, &document, public_key),
        (None, Some(key_id)) => {
            integrity
                .verify_document_with_registry_key(&request.payload, &document, key_id)
                .await?
        }
        _ => {
            return Err(ApiError::ValidationError(
                "Provide exactly one of public_key or key_id".to_string(),
            ))
        }
    };
    Ok(HttpResponse::Ok().json(result))
}
