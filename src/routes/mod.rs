mod document_routes;
mod signature_routes;

pub use document_routes::configure as configure_document_routes;
pub use signature_routes::configure as configure_signature_routes;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    configure_document_routes(cfg);
    configure_signature_routes(cfg);
}
