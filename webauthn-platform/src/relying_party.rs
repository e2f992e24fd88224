//! Relying party contract
//!
//! The client does not speak any relying party protocol itself. A
//! [`RelyingParty`] implementation fetches ceremony options from the server
//! and submits results back for verification. Each implementation binds its
//! own request and response types, which only have to convert into the
//! ceremony options this crate understands.

use async_trait::async_trait;

use crate::options::{PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions};
use crate::response::{PublicKeyCredentialCreateResult, PublicKeyCredentialGetResult};

/// Server side of the ceremonies
#[async_trait]
pub trait RelyingParty: Send + Sync + 'static {
    /// Input for starting a registration (account details, server hints, ...)
    type RegistrationOptions: Send + 'static;

    /// Server answer to a registration request
    type RegistrationData: Into<PublicKeyCredentialCreationOptions> + Send;

    /// Input for starting an authentication
    type AuthenticationOptions: Send + 'static;

    /// Server answer to an authentication request
    type AuthenticationData: Into<PublicKeyCredentialRequestOptions> + Send;

    /// Transport or protocol failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch registration options
    async fn registration_data(
        &self,
        options: Self::RegistrationOptions,
    ) -> Result<Self::RegistrationData, Self::Error>;

    /// Submit a registration result
    ///
    /// # Returns
    ///
    /// Whether the server accepted the credential
    async fn verify_registration(&self, result: &PublicKeyCredentialCreateResult) -> Result<bool, Self::Error>;

    /// Fetch authentication options
    async fn authentication_data(
        &self,
        options: Self::AuthenticationOptions,
    ) -> Result<Self::AuthenticationData, Self::Error>;

    /// Submit an assertion
    ///
    /// # Returns
    ///
    /// Whether the server accepted the assertion
    async fn verify_authentication(&self, result: &PublicKeyCredentialGetResult) -> Result<bool, Self::Error>;
}
