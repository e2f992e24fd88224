//! WebAuthn extension processing
//!
//! Supported extensions:
//! - **credProtect** (authenticator): the requested protection level is
//!   echoed back in the registration's authenticator data
//! - **credProps** (client): reports that the created credential is
//!   client-side discoverable
//!
//! Spec: <https://www.w3.org/TR/webauthn-2/#sctn-extensions>

use serde::{Deserialize, Serialize};

use crate::cbor;
use crate::error::Result;

/// credProtect extension identifier
pub const CRED_PROTECT: &str = "credProtect";

/// Credential protection policy (CTAP 2.1 credProtect)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CredentialProtectionPolicy {
    #[default]
    #[serde(rename = "userVerificationOptional")]
    UserVerificationOptional = 0x01,

    #[serde(rename = "userVerificationOptionalWithCredentialIDList")]
    UserVerificationOptionalWithCredentialIdList = 0x02,

    #[serde(rename = "userVerificationRequired")]
    UserVerificationRequired = 0x03,
}

impl CredentialProtectionPolicy {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::UserVerificationOptional),
            0x02 => Some(Self::UserVerificationOptionalWithCredentialIdList),
            0x03 => Some(Self::UserVerificationRequired),
            _ => None,
        }
    }
}

/// Client extension inputs as supplied by the relying party
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientExtensionsInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_props: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_protection_policy: Option<CredentialProtectionPolicy>,
}

impl ClientExtensionsInput {
    /// Translate client inputs into what the authenticator processes
    pub fn process_authenticator_extensions_input(&self) -> AuthenticatorExtensionsInput {
        AuthenticatorExtensionsInput {
            cred_protect: self.credential_protection_policy,
        }
    }

    /// Client extension outputs for a registration or an assertion
    ///
    /// Returns `None` when no requested extension produces client output.
    pub fn process_client_extensions_output(&self) -> Option<ClientExtensionsOutput> {
        let cred_props = self
            .cred_props
            .filter(|requested| *requested)
            .map(|_| CredentialPropertiesOutput { rk: true });

        cred_props.map(|cred_props| ClientExtensionsOutput {
            cred_props: Some(cred_props),
        })
    }
}

/// Extension inputs handed to the authenticator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthenticatorExtensionsInput {
    pub cred_protect: Option<CredentialProtectionPolicy>,
}

impl AuthenticatorExtensionsInput {
    pub fn is_empty(&self) -> bool {
        self.cred_protect.is_none()
    }

    /// Outputs produced for a makeCredential request
    ///
    /// Returns `None` when nothing was processed; the ED flag follows the
    /// presence of this value.
    pub fn process_make_credential(&self) -> Option<AuthenticatorExtensionsOutput> {
        self.cred_protect.map(|policy| AuthenticatorExtensionsOutput {
            cred_protect: Some(policy.to_u8()),
        })
    }
}

/// Authenticator extension outputs, embedded as CBOR in authenticator data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorExtensionsOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_protect: Option<u8>,
}

impl AuthenticatorExtensionsOutput {
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        cbor::encode(self)
    }

    pub fn from_cbor(data: &[u8]) -> Result<Self> {
        cbor::decode(data)
    }
}

/// credProps client output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPropertiesOutput {
    /// Resident key: whether the credential is client-side discoverable
    pub rk: bool,
}

/// Client extension outputs returned to the relying party
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientExtensionsOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_props: Option<CredentialPropertiesOutput>,
}
