use actix_web::web;
use crate::handlers::signature_handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/signatures")
            .route("", web::post().to(signature_handlers::request_signature))
            .route("", web::get().to(signature_handlers::list_signatures))
            .route("/document/{document_id}", web::get().to(signature_handlers::get_document_signatures))
            .route("/document/{document_id}/stats", web::get().to(signature_handlers::get_document_stats))
            .route("/document/{document_id}/approved", web::get().to(signature_handlers::get_document_approval))
            .route("/{id}", web::get().to(signature_handlers::get_signature))
            .route("/{id}", web::put().to(signature_handlers::update_signature))
            .route("/{id}", web::delete().to(signature_handlers::delete_signature))
            .route("/{id}/sign", web::post().to(signature_handlers::sign_signature))
            .route("/{id}/reject", web::post().to(signature_handlers::reject_signature))
            .route("/{id}/reset", web::post().to(signature_handlers::reset_signature))
    );
}
