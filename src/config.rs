use std::{env, path::PathBuf, fs, str::FromStr, time::Duration};
use log::{info, debug};

use crate::models::KeyFile;
use crate::traits::KeyPair;
use crate::utils::crypto::{CryptoError, Ed25519KeyPair, RsaKeyPair, SigningAlgorithm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDB,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDB),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown SIGNATURE_STORE: {}", other)),
        }
    }
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub store: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub key_registry_url: Option<String>,
    pub key_registry_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| format!("SERVER_PORT must be a number: {}", e))?;
        let store = env::var("SIGNATURE_STORE")
            .unwrap_or_else(|_| "mongodb".to_string())
            .parse::<StoreBackend>()?;
        let timeout_ms = env::var("KEY_REGISTRY_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u64>()
            .map_err(|e| format!("KEY_REGISTRY_TIMEOUT_MS must be a number: {}", e))?;

        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            store,
            mongodb_uri: env::var("MONGODB_URI").ok().filter(|uri| !uri.is_empty()),
            mongodb_database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "document_signing".to_string()),
            key_registry_url: env::var("KEY_REGISTRY_URL").ok().filter(|url| !url.is_empty()),
            key_registry_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

pub struct KeyConfig {
    pub algorithm: SigningAlgorithm,
    pub key_pair: Box<dyn KeyPair>,
}

impl KeyConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let algorithm = env::var("SIGNING_ALGORITHM")
            .unwrap_or_else(|_| "ed25519".to_string())
            .parse::<SigningAlgorithm>()?;
        let key_file = env::var("SIGNING_KEY_FILE").unwrap_or_else(|_| "signing_keypair.json".to_string());

        let key_pair = load_keypair(algorithm, "SIGNING_PRIVATE_KEY", &key_file)?;
        Ok(KeyConfig { algorithm, key_pair })
    }
}

pub fn parse_private_key(algorithm: SigningAlgorithm, encoded: &str) -> Result<Box<dyn KeyPair>, CryptoError> {
    match algorithm {
        SigningAlgorithm::Ed25519 => Ok(Box::new(Ed25519KeyPair::from_base64_seed(encoded)?)),
        SigningAlgorithm::Rsa => Ok(Box::new(RsaKeyPair::from_pkcs8(encoded)?)),
    }
}

fn load_keypair(
    algorithm: SigningAlgorithm,
    env_var_name: &str,
    json_file_path: &str,
) -> Result<Box<dyn KeyPair>, Box<dyn std::error::Error>> {
    // First try to load from environment variable
    if let Ok(private_key_str) = env::var(env_var_name) {
        info!("Loading {} signing key from environment variable {}", algorithm, env_var_name);
        let key_pair = parse_private_key(algorithm, &private_key_str)
            .map_err(|e| format!("Invalid private key in {}: {}", env_var_name, e))?;
        return Ok(key_pair);
    }

    // Fall back to JSON file
    info!("Environment variable {} not found, falling back to JSON file: {}", env_var_name, json_file_path);
    load_keypair_from_json(algorithm, json_file_path)
}

fn load_keypair_from_json(
    algorithm: SigningAlgorithm,
    json_file_path: &str,
) -> Result<Box<dyn KeyPair>, Box<dyn std::error::Error>> {
    let path = PathBuf::from(json_file_path);

    if !path.exists() {
        return Err(format!("Keypair file not found: {}", json_file_path).into());
    }

    debug!("Reading keypair from JSON file: {}", json_file_path);
    let key_file: KeyFile = serde_json::from_str(&fs::read_to_string(&path)?)?;
    if key_file.algorithm != algorithm {
        return Err(format!(
            "Keypair file {} holds a {} key but SIGNING_ALGORITHM is {}",
            json_file_path, key_file.algorithm, algorithm
        )
        .into());
    }

    let key_pair = parse_private_key(algorithm, &key_file.private_key)?;
    let public_key = key_pair.public_key().to_base64()?;
    if public_key != key_file.public_key {
        return Err(format!("Public key in {} does not match its private key", json_file_path).into());
    }

    info!("Successfully loaded keypair from {} with pubkey: {}", json_file_path, public_key);
    Ok(key_pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_key_file(key_file: &KeyFile) -> PathBuf {
        let path = env::temp_dir().join(format!("signing-key-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, serde_json::to_string(key_file).unwrap()).unwrap();
        path
    }

    fn ed25519_key_file() -> KeyFile {
        let key = Ed25519KeyPair::generate();
        KeyFile {
            algorithm: SigningAlgorithm::Ed25519,
            public_key: key.public_key().to_base64().unwrap(),
            private_key: key.to_base64_seed(),
        }
    }

    #[test]
    fn test_load_keypair_from_json() {
        let key_file = ed25519_key_file();
        let path = write_key_file(&key_file);

        let key_pair = load_keypair_from_json(SigningAlgorithm::Ed25519, path.to_str().unwrap()).unwrap();
        assert_eq!(key_pair.public_key().to_base64().unwrap(), key_file.public_key);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_keypair_rejects_mismatches() {
        let mut key_file = ed25519_key_file();
        let path = write_key_file(&key_file);
        let result = load_keypair_from_json(SigningAlgorithm::Rsa, path.to_str().unwrap());
        assert!(result.err().unwrap().to_string().contains("SIGNING_ALGORITHM"));
        fs::remove_file(path).unwrap();

        key_file.public_key = ed25519_key_file().public_key;
        let path = write_key_file(&key_file);
        let result = load_keypair_from_json(SigningAlgorithm::Ed25519, path.to_str().unwrap());
        assert!(result.err().unwrap().to_string().contains("does not match"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_key_file_is_fatal() {
        let result = load_keypair_from_json(SigningAlgorithm::Ed25519, "/nonexistent/signing_keypair.json");
        assert!(result.err().unwrap().to_string().contains("Keypair file not found"));
    }

    #[test]
    fn test_parse_private_key_by_algorithm() {
        let key = Ed25519KeyPair::generate();
        let parsed = parse_private_key(SigningAlgorithm::Ed25519, &key.to_base64_seed()).unwrap();
        assert_eq!(parsed.algorithm(), SigningAlgorithm::Ed25519);

        assert!(parse_private_key(SigningAlgorithm::Rsa, &key.to_base64_seed()).is_err());
        assert!(parse_private_key(SigningAlgorithm::Ed25519, "garbage").is_err());
    }

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("MongoDB".parse::<StoreBackend>().unwrap(), StoreBackend::MongoDB);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
