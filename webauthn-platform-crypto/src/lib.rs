//! Cryptographic primitives for a WebAuthn platform authenticator
//!
//! Only the algorithm the authenticator actually issues credentials for is
//! implemented here:
//!
//! - **ECDSA**: ES256 (P-256 + SHA-256) key generation, signing and verification
//!
//! COSE algorithm registry:
//! <https://www.iana.org/assignments/cose/cose.xhtml#algorithms>

pub mod ecdsa;
pub mod error;

pub use error::{CryptoError, Result};
