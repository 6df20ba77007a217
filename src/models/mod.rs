pub mod error;
pub mod key;
pub mod payload;
pub mod signature;
pub mod verification;

pub use error::{ApiError, ErrorResponse, SignatureError, StorageError};
pub use key::KeyFile;
pub use payload::*;
pub use signature::*;
pub use verification::*;
