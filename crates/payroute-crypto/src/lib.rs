pub mod error;
pub mod hashing;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{derive_address, hash};
pub use keys::{KeyPair, PublicKey};
pub use signing::{sign, sign_digest, verify, verify_digest, Signature};
