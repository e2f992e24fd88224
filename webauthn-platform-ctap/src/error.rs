//! Error taxonomy for WebAuthn ceremonies
//!
//! Every failure crossing the public surface is a [`WebAuthnError`]. Variants
//! carry the credential id when it is known and, for failures that happened
//! while cleaning up after another failure, the error that triggered the
//! cleanup (`delete_trigger`).

use core::fmt;

use thiserror::Error;
use webauthn_platform_crypto::CryptoError;

use crate::types::CredentialId;

/// Boxed foreign error carried inside the taxonomy
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for WebAuthn operations
pub type Result<T> = core::result::Result<T, WebAuthnError>;

/// WebAuthn core error kinds (the DOMException names used by the standard)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreErrorKind {
    TypeError,
    NotSupportedError,
    NotAllowedError,
    InvalidStateError,
    ConstraintError,
}

impl CoreErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeError => "TypeError",
            Self::NotSupportedError => "NotSupportedError",
            Self::NotAllowedError => "NotAllowedError",
            Self::InvalidStateError => "InvalidStateError",
            Self::ConstraintError => "ConstraintError",
        }
    }
}

impl fmt::Display for CoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key store failures
///
/// The `status` values are platform status codes reported by the secure
/// key store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyStorageError {
    #[error("Key storage access failed")]
    AccessFailed,

    #[error("Invalid item found in key storage")]
    InvalidItemFound,

    #[error("Failed to load key (status {status})")]
    LoadFailed { status: i32 },

    #[error("Failed to store key (status {status})")]
    StoreFailed { status: i32 },

    #[error("Failed to update key (status {status})")]
    UpdateFailed { status: i32 },

    #[error("Failed to delete key (status {status})")]
    DeleteFailed { status: i32 },
}

/// WebAuthn ceremony error
#[derive(Debug, Error)]
pub enum WebAuthnError {
    #[error("{kind}: {}", .cause.as_deref().unwrap_or("no details"))]
    Core {
        kind: CoreErrorKind,
        cause: Option<String>,
    },

    #[error("Key storage error for credential {credential_id}: {source}")]
    KeyStorage {
        source: KeyStorageError,
        credential_id: CredentialId,
        delete_trigger: Option<Box<WebAuthnError>>,
    },

    #[error("Credential source storage error{}: {source}", fmt_credential(.credential_id))]
    CredentialSourceStorage {
        source: BoxError,
        credential_id: Option<CredentialId>,
        delete_trigger: Option<Box<WebAuthnError>>,
    },

    #[error("Relying party error: {0}")]
    RelyingParty(#[source] BoxError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Platform user-verification failure, passed through unchanged
    #[error("Local authentication failed: {0}")]
    LocalAuthentication(#[source] BoxError),

    #[error("Security key error: {cause}")]
    SecKey { cause: String },

    #[error("Private key not found")]
    KeyNotFound,

    #[error("Utility error: {cause}")]
    Utility { cause: String },

    #[error("Unknown error: {0}")]
    Unknown(#[source] BoxError),
}

fn fmt_credential(id: &Option<CredentialId>) -> String {
    id.as_ref()
        .map(|id| format!(" for credential {id}"))
        .unwrap_or_default()
}

impl WebAuthnError {
    /// Build a core error with a human-readable cause
    pub fn core(kind: CoreErrorKind, cause: impl Into<String>) -> Self {
        Self::Core {
            kind,
            cause: Some(cause.into()),
        }
    }

    pub fn key_storage(source: KeyStorageError, credential_id: &CredentialId) -> Self {
        Self::KeyStorage {
            source,
            credential_id: credential_id.clone(),
            delete_trigger: None,
        }
    }

    pub fn source_storage<E>(source: E, credential_id: Option<&CredentialId>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CredentialSourceStorage {
            source: Box::new(source),
            credential_id: credential_id.cloned(),
            delete_trigger: None,
        }
    }

    pub fn relying_party<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RelyingParty(Box::new(source))
    }

    /// The core error kind, if this is a core error
    pub fn core_kind(&self) -> Option<CoreErrorKind> {
        match self {
            Self::Core { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Credential id the failure is attributed to, when known
    pub fn credential_id(&self) -> Option<&CredentialId> {
        match self {
            Self::KeyStorage { credential_id, .. } => Some(credential_id),
            Self::CredentialSourceStorage { credential_id, .. } => credential_id.as_ref(),
            _ => None,
        }
    }

    /// The original error that started a compensating delete which then failed
    pub fn delete_trigger(&self) -> Option<&WebAuthnError> {
        match self {
            Self::KeyStorage { delete_trigger, .. }
            | Self::CredentialSourceStorage { delete_trigger, .. } => delete_trigger.as_deref(),
            _ => None,
        }
    }

    /// True when this error reports a failed cleanup rather than a primary failure
    pub fn is_compensation_failure(&self) -> bool {
        self.delete_trigger().is_some()
    }

    /// Attach the error that caused a delete; used when the delete itself failed
    pub(crate) fn triggered_by(mut self, trigger: WebAuthnError) -> Self {
        match &mut self {
            Self::KeyStorage { delete_trigger, .. }
            | Self::CredentialSourceStorage { delete_trigger, .. } => {
                *delete_trigger = Some(Box::new(trigger));
            }
            _ => {}
        }
        self
    }
}

impl From<CryptoError> for WebAuthnError {
    fn from(err: CryptoError) -> Self {
        Self::SecKey {
            cause: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_core_display() {
        let err = WebAuthnError::core(CoreErrorKind::InvalidStateError, "already registered");
        assert_eq!(err.to_string(), "InvalidStateError: already registered");
        assert_eq!(err.core_kind(), Some(CoreErrorKind::InvalidStateError));
        assert!(err.credential_id().is_none());
    }

    #[test]
    fn test_key_storage_carries_id() {
        let id = CredentialId::new(vec![1, 2, 3]);
        let err = WebAuthnError::key_storage(KeyStorageError::StoreFailed { status: -67671 }, &id);

        assert_eq!(err.credential_id(), Some(&id));
        assert!(!err.is_compensation_failure());
        assert_eq!(
            err.to_string(),
            "Key storage error for credential AQID: Failed to store key (status -67671)"
        );
    }

    #[test]
    fn test_source_storage_downcast() {
        let err = WebAuthnError::source_storage(DiskError, None);

        match &err {
            WebAuthnError::CredentialSourceStorage { source, .. } => {
                assert!(source.downcast_ref::<DiskError>().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Credential source storage error: disk on fire");
    }

    #[test]
    fn test_triggered_by() {
        let id = CredentialId::new(vec![4]);
        let trigger = WebAuthnError::relying_party(DiskError);
        let err = WebAuthnError::key_storage(KeyStorageError::DeleteFailed { status: -1 }, &id)
            .triggered_by(trigger);

        assert!(err.is_compensation_failure());
        assert!(matches!(
            err.delete_trigger(),
            Some(WebAuthnError::RelyingParty(_))
        ));
    }

    #[test]
    fn test_crypto_error_maps_to_sec_key() {
        let err: WebAuthnError = CryptoError::InvalidPrivateKey.into();
        assert!(matches!(err, WebAuthnError::SecKey { ref cause } if cause == "Invalid private key"));
    }
}
