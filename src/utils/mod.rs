pub mod crypto;
pub mod qr_payload;

pub use crypto::SignerContext;
