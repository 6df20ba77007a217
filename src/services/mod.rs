mod mongodb;
mod memory_store;
mod key_registry;
mod integrity_service;
mod signature_service;
mod signature_aggregator;

pub use mongodb::MongoDBService;
pub use memory_store::InMemorySignatureStore;
pub use key_registry::{KeyRegistryClient, KeyRegistryError};
pub use integrity_service::IntegrityService;
pub use signature_service::SignatureService;
pub use signature_aggregator::SignatureAggregator;
