//! Error types for cryptographic operations

use thiserror::Error;

/// Cryptographic operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Public key is not a valid SEC1 point on P-256
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Private scalar is zero or out of range
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Signature could not be parsed or did not verify
    #[error("Invalid signature")]
    InvalidSignature,

    /// Key material has the wrong size
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Result type alias for cryptographic operations
pub type Result<T> = core::result::Result<T, CryptoError>;
