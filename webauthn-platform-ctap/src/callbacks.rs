//! Collaborator traits for the authenticator
//!
//! The engine owns no storage and no UI. Key material, credential source
//! records and the local user-verification prompt are provided by the
//! platform through these traits; in-memory implementations are used in tests.
//!
//! Storage calls are synchronous (keychain-style APIs); user verification is
//! asynchronous because it waits on the user.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{BoxError, KeyStorageError};
use crate::key::PrivateKey;
use crate::types::{CredentialId, PublicKeyCredentialSource};

/// Secure private key storage
pub trait KeyStore: Send + Sync {
    /// Store the private key for a credential id
    fn store(&self, id: &CredentialId, key: &PrivateKey) -> Result<(), KeyStorageError>;

    /// Load the private key for a credential id
    ///
    /// # Returns
    ///
    /// `Ok(None)` if no key exists under the id
    fn load(&self, id: &CredentialId) -> Result<Option<PrivateKey>, KeyStorageError>;

    /// Delete the private key for a credential id
    fn delete(&self, id: &CredentialId) -> Result<(), KeyStorageError>;
}

/// Credential source record storage
pub trait CredentialSourceStore: Send + Sync {
    /// Backend-specific failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the source for a credential id, `None` if unknown
    fn load(&self, id: &CredentialId) -> Result<Option<PublicKeyCredentialSource>, Self::Error>;

    /// Load every stored source
    fn load_all(&self) -> Result<Vec<PublicKeyCredentialSource>, Self::Error>;

    /// Persist a new source
    fn store(&self, source: &PublicKeyCredentialSource) -> Result<(), Self::Error>;

    /// Delete the source for a credential id
    fn delete(&self, id: &CredentialId) -> Result<(), Self::Error>;

    /// Increment the signature counter and return the new value
    ///
    /// Must be atomic with respect to concurrent calls for the same id.
    fn increase_signature_counter(&self, id: &CredentialId) -> Result<u32, Self::Error>;
}

/// Failure reported by the local user-verification prompt
#[derive(Debug, Error)]
pub enum UserVerificationError {
    /// No verification mechanism is enrolled or the policy cannot be evaluated
    #[error("User verification unavailable: {0}")]
    Unavailable(String),

    /// Verification was attempted and failed (cancelled, lockout, mismatch, ...)
    #[error(transparent)]
    Platform(BoxError),
}

/// Local user verification (biometric or passcode prompt)
#[async_trait]
pub trait LocalAuthenticator: Send + Sync {
    /// Prompt the user
    ///
    /// # Returns
    ///
    /// Whether the user was verified
    async fn execute(&self) -> Result<bool, UserVerificationError>;
}
