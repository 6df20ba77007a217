use actix_web::web;
use crate::handlers::document_handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/documents")
            .route("/public-key", web::get().to(document_handlers::get_public_key))
            .route("/hash", web::post().to(document_handlers::hash_document))
            .route("/seal", web::post().to(document_handlers::seal_document))
            .route("/verify", web::post().to(document_handlers::verify_document))
            .route("/verify-offline", web::post().to(document_handlers::verify_document_offline))
    );
}
