use serde::{Deserialize, Serialize};

use crate::utils::crypto::SigningAlgorithm;

/// On-disk key file written by `generate_keys`.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub algorithm: SigningAlgorithm,
    pub public_key: String,
    pub private_key: String,
}
