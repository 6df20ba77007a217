use std::{fs, path::PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use clap::{Parser, ValueEnum};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::json;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    Ed25519,
    Rsa,
}

/// Generate a signing keypair in the JSON layout read from SIGNING_KEY_FILE.
#[derive(Parser, Debug)]
#[command(name = "generate_keys")]
struct Args {
    #[arg(long, value_enum, default_value = "ed25519")]
    algorithm: Algorithm,

    /// RSA modulus size, ignored for ed25519
    #[arg(long, default_value_t = 2048)]
    bits: usize,

    /// Write to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let key_file = match args.algorithm {
        Algorithm::Ed25519 => {
            let signing_key = SigningKey::generate(&mut OsRng);
            json!({
                "algorithm": "ed25519",
                "public_key": BASE64.encode(signing_key.verifying_key().as_bytes()),
                "private_key": BASE64.encode(signing_key.to_bytes()),
            })
        }
        Algorithm::Rsa => {
            let private_key = RsaPrivateKey::new(&mut OsRng, args.bits)?;
            let public_der = RsaPublicKey::from(&private_key).to_public_key_der()?;
            let private_pem = private_key.to_pkcs8_pem(LineEnding::LF)?;
            json!({
                "algorithm": "rsa",
                "public_key": BASE64.encode(public_der.as_bytes()),
                "private_key": private_pem.as_str(),
            })
        }
    };

    let rendered = serde_json::to_string_pretty(&key_file)?;
    match args.out {
        Some(path) => {
            fs::write(&path, rendered)?;
            println!("Wrote {:?} keypair to {}", args.algorithm, path.display());
            println!("Public key: {}", key_file["public_key"].as_str().unwrap_or_default());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
