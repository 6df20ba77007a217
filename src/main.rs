use std::sync::Arc;
use actix_web::{App, HttpServer, web, middleware::Logger};
use actix_cors::Cors;
use log::{info, warn};
use dotenv::dotenv;
mod models;
mod handlers;
mod routes;
mod services;
mod utils;
mod config;
mod traits;
use config::{KeyConfig, ServerConfig, StoreBackend};
use services::{
    InMemorySignatureStore, IntegrityService, KeyRegistryClient, MongoDBService, SignatureAggregator,
    SignatureService,
};
use traits::SignatureStore;
use utils::SignerContext;

async fn init_store(config: &ServerConfig) -> Result<Arc<dyn SignatureStore>, Box<dyn std::error::Error>> {
    match config.store {
        StoreBackend::MongoDB => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .ok_or("MONGODB_URI must be set when SIGNATURE_STORE=mongodb")?;
            let mongodb = MongoDBService::init(uri, &config.mongodb_database).await?;
            info!("Using MongoDB signature store, database {}", config.mongodb_database);
            Ok(Arc::new(mongodb))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory signature store, records will not survive a restart");
            Ok(Arc::new(InMemorySignatureStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    let config = ServerConfig::from_env()?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_level.clone()));

    let store = init_store(&config).await?;

    // Load signing key from environment variable or JSON file
    let key_config = KeyConfig::load()?;
    let signer = Arc::new(SignerContext::new(key_config.key_pair)?);
    info!("Signing with {} key: {}", key_config.algorithm, signer.encoded_public_key());

    let key_registry = match &config.key_registry_url {
        Some(url) => {
            info!("Key registry configured at {}", url);
            Some(KeyRegistryClient::new(url, config.key_registry_timeout)?)
        }
        None => None,
    };

    let integrity_service = web::Data::new(IntegrityService::new(signer, key_registry));
    let signature_service = web::Data::new(SignatureService::new(store.clone()));
    let signature_aggregator = web::Data::new(SignatureAggregator::new(store));

    let (host, port) = (config.host.clone(), config.port);
    info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        // Configure CORS middleware
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_headers(vec!["content-type", "content-length", "accept"])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(integrity_service.clone())
            .app_data(signature_service.clone())
            .app_data(signature_aggregator.clone())
            .configure(routes::configure)
            .route("/health", web::get().to(handlers::health_check))
    })
    .bind(format!("{host}:{port}"))?
    .run()
    .await?;

    info!("Server shutting down");
    Ok(())
}
