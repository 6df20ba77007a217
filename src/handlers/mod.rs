pub mod document_handlers;
pub mod signature_handlers;

use actix_web::{HttpResponse, Responder};
use log::info;

pub async fn health_check() -> impl Responder {
    info!("Health check");
    HttpResponse::Ok().body("OK")
}
