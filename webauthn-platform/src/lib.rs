//! # webauthn-platform
//!
//! A WebAuthn 2.0 platform authenticator: register and authenticate with
//! public-key credentials instead of passwords.
//!
//! ## Architecture
//!
//! - **Credential**: [`PublicKeyCredential`] runs `create` / `get` ceremonies
//!   against a [`RelyingParty`], rolling back storage when a registration is
//!   not accepted
//! - **Queue**: [`CeremonyQueue`] runs ceremonies one at a time in FIFO order
//! - **Authenticator**: re-exported from `webauthn-platform-ctap`; key and
//!   credential source storage plus user verification are supplied by the
//!   platform through [`KeyStore`], [`CredentialSourceStore`] and
//!   [`LocalAuthenticator`]
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use webauthn_platform::*;
//! # async fn register<R, K, S, L>(rp: Arc<R>, keys: Arc<K>, sources: Arc<S>, prompt: Arc<L>, options: R::RegistrationOptions) -> Result<()>
//! # where R: RelyingParty, K: KeyStore + 'static, S: CredentialSourceStore + 'static, L: LocalAuthenticator + 'static {
//! let credential = PublicKeyCredential::biometric(rp, keys, sources, prompt)
//!     .with_origin("ios:bundle-id:com.example.app");
//!
//! let accepted = credential.create(options).await?;
//! # let _ = accepted;
//! # Ok(())
//! # }
//! ```

pub mod client_data;
pub mod credential;
pub mod options;
pub mod queue;
pub mod relying_party;
pub mod response;

pub use webauthn_platform_ctap as ctap;

pub use client_data::{ClientDataType, CollectedClientData};
pub use credential::PublicKeyCredential;
pub use options::{
    AttestationConveyancePreference, AuthenticatorAttachment, AuthenticatorSelectionCriteria,
    PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions, ResidentKeyRequirement,
    UserVerificationRequirement,
};
pub use queue::{CeremonyQueue, CeremonyState, Ticket};
pub use relying_party::RelyingParty;
pub use response::{PublicKeyCredentialCreateResult, PublicKeyCredentialGetResult};

pub use webauthn_platform_ctap::{
    AuthenticatorType, BoxError, ClientExtensionsInput, ClientExtensionsOutput, CoreErrorKind,
    CoseAlgorithm, CredentialId, CredentialProtectionPolicy, CredentialSourceStore, KeyStorageError,
    KeyStore, LocalAuthenticator, PrivateKey, PublicKeyCredentialDescriptor,
    PublicKeyCredentialParameters, PublicKeyCredentialRpEntity, PublicKeyCredentialSource,
    PublicKeyCredentialUserEntity, Result, UserVerificationError, WebAuthnError,
};
