use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

use crate::models::{
    RejectSignatureRequest, RequestSignatureRequest, SignDocumentRequest,
    SignatureError, SignatureResponse, StatusQuery, UpdateSignatureRequest,
};
use crate::services::{SignatureAggregator, SignatureService};

fn to_responses(records: Vec<crate::models::SignatureRecord>) -> Vec<SignatureResponse> {
    records.into_iter().map(SignatureResponse::from).collect()
}

pub async fn request_signature(
    signatures: web::Data<SignatureService>,
    request: web::Json<RequestSignatureRequest>,
) -> Result<HttpResponse, SignatureError> {
    info!("Signature requested from {} on document {}", request.signer_id, request.document_id);
    let record = signatures.request_signature(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(SignatureResponse::from(record)))
}

pub async fn get_signature(
    signatures: web::Data<SignatureService>,
    signature_id: web::Path<String>,
) -> Result<HttpResponse, SignatureError> {
    let record = signatures.get_signature(&signature_id).await?;
    Ok(HttpResponse::Ok().json(SignatureResponse::from(record)))
}

pub async fn list_signatures(
    signatures: web::Data<SignatureService>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, SignatureError> {
    let records = signatures.list_by_status(query.status).await?;
    info!("Found {} {} signatures", records.len(), query.status);
    Ok(HttpResponse::Ok().json(to_responses(records)))
}

pub async fn get_document_signatures(
    signatures: web::Data<SignatureService>,
    document_id: web::Path<String>,
) -> Result<HttpResponse, SignatureError> {
    let records = signatures.get_document_signatures(&document_id).await?;
    Ok(HttpResponse::Ok().json(to_responses(records)))
}

pub async fn get_document_stats(
    aggregator: web::Data<SignatureAggregator>,
    document_id: web::Path<String>,
) -> Result<HttpResponse, SignatureError> {
    let approval = aggregator.approval(&document_id).await?;
    Ok(HttpResponse::Ok().json(approval))
}

pub async fn get_document_approval(
    aggregator: web::Data<SignatureAggregator>,
    document_id: web::Path<String>,
) -> Result<HttpResponse, SignatureError> {
    let fully_approved = aggregator.is_fully_approved(&document_id).await?;
    info!("Document {} fully approved: {}", document_id, fully_approved);
    Ok(HttpResponse::Ok().json(json!({
        "document_id": document_id.into_inner(),
        "fully_approved": fully_approved,
    })))
}

pub async fn sign_signature(
    signatures: web::Data<SignatureService>,
    signature_id: web::Path<String>,
    request: web::Json<SignDocumentRequest>,
) -> Result<HttpResponse, SignatureError> {
    info!("Signing signature {}", signature_id);
    let record = signatures
        .sign(&signature_id, request.into_inner().signature_blob)
        .await?;
    Ok(HttpResponse::Ok().json(SignatureResponse::from(record)))
}

pub async fn reject_signature(
    signatures: web::Data<SignatureService>,
    signature_id: web::Path<String>,
    request: web::Json<RejectSignatureRequest>,
) -> Result<HttpResponse, SignatureError> {
    info!("Rejecting signature {}", signature_id);
    let record = signatures
        .reject(&signature_id, request.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(SignatureResponse::from(record)))
}

pub async fn reset_signature(
    signatures: web::Data<SignatureService>,
    signature_id: web::Path<String>,
) -> Result<HttpResponse, SignatureError> {
    info!("Resetting signature {}", signature_id);
    let record = signatures.reset(&signature_id).await?;
    Ok(HttpResponse::Ok().json(SignatureResponse::from(record)))
}

pub async fn update_signature(
    signatures: web::Data<SignatureService>,
    signature_id: web::Path<String>,
    request: web::Json<UpdateSignatureRequest>,
) -> Result<HttpResponse, SignatureError> {
    let record = signatures
        .update_metadata(&signature_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SignatureResponse::from(record)))
}

pub async fn delete_signature(
    signatures: web::Data<SignatureService>,
    signature_id: web::Path<String>,
) -> Result<HttpResponse, SignatureError> {
    info!("Deleting signature {}", signature_id);
    signatures.delete_signature(&signature_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
