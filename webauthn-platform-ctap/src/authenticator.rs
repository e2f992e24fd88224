//! Platform authenticator
//!
//! Binds the collaborators (key store, credential source store, local user
//! verification) to an [`AuthenticatorConfig`] and exposes the two WebAuthn
//! authenticator operations.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::authenticator_type::AuthenticatorType;
use crate::callbacks::{CredentialSourceStore, KeyStore, LocalAuthenticator, UserVerificationError};
use crate::commands::get_assertion::{self, GetAssertionRequest, GetAssertionResponse};
use crate::commands::make_credential::{self, MakeCredentialRequest, MakeCredentialResponse};
use crate::cose::CoseAlgorithm;
use crate::error::{CoreErrorKind, Result, WebAuthnError};

/// Default random credential id length in bytes
pub const DEFAULT_CREDENTIAL_ID_LENGTH: usize = 32;

const MIN_CREDENTIAL_ID_LENGTH: usize = 16;
// WebAuthn caps credential ids at 1023 bytes
const MAX_CREDENTIAL_ID_LENGTH: usize = 1023;

/// Authenticator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorConfig {
    /// Kind of authenticator; fixes the AAGUID written into attested credential data
    pub authenticator_type: AuthenticatorType,

    /// COSE algorithms this authenticator will generate keys for
    pub algorithms: Vec<CoseAlgorithm>,

    /// Length of generated credential ids
    pub credential_id_length: usize,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            authenticator_type: AuthenticatorType::Biometric,
            algorithms: vec![CoseAlgorithm::Es256],
            credential_id_length: DEFAULT_CREDENTIAL_ID_LENGTH,
        }
    }
}

impl AuthenticatorConfig {
    pub fn new(authenticator_type: AuthenticatorType) -> Self {
        Self {
            authenticator_type,
            ..Self::default()
        }
    }

    /// Restrict or reorder the algorithms used for key generation
    ///
    /// Only ES256 keys can actually be generated; other entries are ignored
    /// during negotiation.
    pub fn with_algorithms(mut self, algorithms: Vec<CoseAlgorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Set the credential id length, clamped to 16..=1023 bytes
    pub fn with_credential_id_length(mut self, length: usize) -> Self {
        self.credential_id_length = length.clamp(MIN_CREDENTIAL_ID_LENGTH, MAX_CREDENTIAL_ID_LENGTH);
        self
    }

    pub fn aaguid(&self) -> Uuid {
        self.authenticator_type.aaguid()
    }

    /// Whether keys for `alg` can be issued
    pub fn supports(&self, alg: CoseAlgorithm) -> bool {
        alg == CoseAlgorithm::Es256 && self.algorithms.contains(&alg)
    }
}

/// WebAuthn platform authenticator
pub struct Authenticator<K, S, L> {
    config: AuthenticatorConfig,
    keys: Arc<K>,
    sources: Arc<S>,
    local_authenticator: Arc<L>,
}

impl<K, S, L> Clone for Authenticator<K, S, L> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            keys: Arc::clone(&self.keys),
            sources: Arc::clone(&self.sources),
            local_authenticator: Arc::clone(&self.local_authenticator),
        }
    }
}

impl<K, S, L> Authenticator<K, S, L>
where
    K: KeyStore,
    S: CredentialSourceStore,
    L: LocalAuthenticator,
{
    pub fn new(config: AuthenticatorConfig, keys: Arc<K>, sources: Arc<S>, local_authenticator: Arc<L>) -> Self {
        Self {
            config,
            keys,
            sources,
            local_authenticator,
        }
    }

    pub fn config(&self) -> &AuthenticatorConfig {
        &self.config
    }

    pub fn key_store(&self) -> &K {
        &self.keys
    }

    pub fn credential_source_store(&self) -> &S {
        &self.sources
    }

    /// authenticatorMakeCredential
    pub async fn make_credential(&self, request: MakeCredentialRequest) -> Result<MakeCredentialResponse> {
        make_credential::handle(self, request).await
    }

    /// authenticatorGetAssertion
    pub async fn get_assertion(&self, request: GetAssertionRequest) -> Result<GetAssertionResponse> {
        get_assertion::handle(self, request).await
    }

    /// Run the local user-verification prompt
    ///
    /// Unavailable verification maps to `ConstraintError`, a negative answer
    /// to `NotAllowedError`; platform failures are passed through boxed.
    pub(crate) async fn verify_user(&self) -> Result<()> {
        match self.local_authenticator.execute().await {
            Ok(true) => {
                debug!(authenticator = %self.config.authenticator_type, "user verified");
                Ok(())
            }
            Ok(false) => Err(WebAuthnError::core(
                CoreErrorKind::NotAllowedError,
                "User verification was not successful",
            )),
            Err(UserVerificationError::Unavailable(reason)) => {
                Err(WebAuthnError::core(CoreErrorKind::ConstraintError, reason))
            }
            Err(UserVerificationError::Platform(err)) => Err(WebAuthnError::LocalAuthentication(err)),
        }
    }
}
