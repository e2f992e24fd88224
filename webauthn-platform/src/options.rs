//! Ceremony options
//!
//! What a relying party hands the client to start a registration or an
//! authentication. Field names follow the WebAuthn JSON casing so relying
//! party adapters can decode server responses straight into these types.

use serde::{Deserialize, Serialize};

use webauthn_platform_ctap::cose::CoseAlgorithm;
use webauthn_platform_ctap::extensions::ClientExtensionsInput;
use webauthn_platform_ctap::types::{
    PublicKeyCredentialDescriptor, PublicKeyCredentialParameters, PublicKeyCredentialRpEntity,
    PublicKeyCredentialUserEntity,
};

/// Algorithms assumed when the relying party lists none
pub const DEFAULT_ALGORITHMS: [CoseAlgorithm; 2] = [CoseAlgorithm::Es256, CoseAlgorithm::Rs256];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    Required,
    #[default]
    Preferred,
    Discouraged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    #[default]
    None,
    Indirect,
    Direct,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticatorAttachment {
    #[serde(rename = "platform")]
    Platform,
    #[serde(rename = "cross-platform")]
    CrossPlatform,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    #[default]
    Discouraged,
    Preferred,
    Required,
}

/// `AuthenticatorSelectionCriteria`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_key: Option<ResidentKeyRequirement>,

    #[serde(default)]
    pub require_resident_key: bool,

    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
}

/// `PublicKeyCredentialCreationOptions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    pub rp: PublicKeyCredentialRpEntity,

    pub user: PublicKeyCredentialUserEntity,

    /// Relying party challenge, carried verbatim into client data
    pub challenge: String,

    /// Acceptable credential types and algorithms, most preferred first
    #[serde(default)]
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,

    /// Milliseconds; informational, the collaborators own their timeouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub exclude_credentials: Vec<PublicKeyCredentialDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,

    #[serde(default)]
    pub attestation: AttestationConveyancePreference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ClientExtensionsInput>,
}

impl PublicKeyCredentialCreationOptions {
    pub fn new(
        rp: PublicKeyCredentialRpEntity,
        user: PublicKeyCredentialUserEntity,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            rp,
            user,
            challenge: challenge.into(),
            pub_key_cred_params: Vec::new(),
            timeout: None,
            exclude_credentials: Vec::new(),
            authenticator_selection: None,
            attestation: AttestationConveyancePreference::None,
            extensions: None,
        }
    }

    pub fn with_pub_key_cred_params(mut self, params: Vec<PublicKeyCredentialParameters>) -> Self {
        self.pub_key_cred_params = params;
        self
    }

    pub fn with_exclude_credentials(mut self, exclude: Vec<PublicKeyCredentialDescriptor>) -> Self {
        self.exclude_credentials = exclude;
        self
    }

    pub fn with_extensions(mut self, extensions: ClientExtensionsInput) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Parameters handed to the authenticator
    ///
    /// An empty list means the relying party expressed no preference and
    /// [`DEFAULT_ALGORITHMS`] apply; otherwise only "public-key" entries are
    /// kept. The result is empty when every entry had another type.
    pub fn acceptable_algorithms(&self) -> Vec<PublicKeyCredentialParameters> {
        if self.pub_key_cred_params.is_empty() {
            return DEFAULT_ALGORITHMS
                .iter()
                .map(|alg| PublicKeyCredentialParameters::new(alg.to_i32()))
                .collect();
        }

        self.pub_key_cred_params
            .iter()
            .filter(|param| param.cred_type == webauthn_platform_ctap::PUBLIC_KEY_TYPE)
            .cloned()
            .collect()
    }
}

/// `PublicKeyCredentialRequestOptions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    pub challenge: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    pub rp_id: String,

    #[serde(default)]
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,

    #[serde(default)]
    pub user_verification: UserVerificationRequirement,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ClientExtensionsInput>,
}

impl PublicKeyCredentialRequestOptions {
    pub fn new(rp_id: impl Into<String>, challenge: impl Into<String>) -> Self {
        Self {
            challenge: challenge.into(),
            timeout: None,
            rp_id: rp_id.into(),
            allow_credentials: Vec::new(),
            user_verification: UserVerificationRequirement::default(),
            extensions: None,
        }
    }

    pub fn with_allow_credentials(mut self, allow: Vec<PublicKeyCredentialDescriptor>) -> Self {
        self.allow_credentials = allow;
        self
    }
}
