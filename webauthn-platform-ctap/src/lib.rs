//! WebAuthn platform authenticator engine
//!
//! This crate provides the authenticator half of a WebAuthn 2.0 platform
//! authenticator:
//!
//! - **Wire formats**: authenticator data, attested credential data, COSE EC2
//!   keys and "none" attestation objects
//! - **Engine**: makeCredential / getAssertion over pluggable key and
//!   credential source stores and a local user-verification prompt
//! - **Errors**: the [`WebAuthnError`] taxonomy shared with the client layer
//!
//! Spec: <https://www.w3.org/TR/webauthn-2/>

pub mod attestation;
pub mod authenticator;
pub mod authenticator_data;
pub mod authenticator_type;
pub mod callbacks;
pub mod cbor;
pub mod commands;
pub mod cose;
pub mod error;
pub mod extensions;
pub mod key;
pub mod rollback;
pub mod types;

// Re-export commonly used types
pub use attestation::NoneAttestationObject;
pub use authenticator::{Authenticator, AuthenticatorConfig};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData};
pub use authenticator_type::AuthenticatorType;
pub use callbacks::{CredentialSourceStore, KeyStore, LocalAuthenticator, UserVerificationError};
pub use commands::{
    GetAssertionRequest, GetAssertionResponse, MakeCredentialRequest, MakeCredentialResponse,
};
pub use cose::{CoseAlgorithm, Ec2CoseKey};
pub use error::{BoxError, CoreErrorKind, KeyStorageError, Result, WebAuthnError};
pub use extensions::{
    AuthenticatorExtensionsInput, AuthenticatorExtensionsOutput, ClientExtensionsInput,
    ClientExtensionsOutput, CredentialPropertiesOutput, CredentialProtectionPolicy,
};
pub use key::PrivateKey;
pub use types::{
    CredentialId, PUBLIC_KEY_TYPE, PublicKeyCredentialDescriptor, PublicKeyCredentialParameters,
    PublicKeyCredentialRpEntity, PublicKeyCredentialSource, PublicKeyCredentialUserEntity,
};
