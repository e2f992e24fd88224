//! Collected client data
//!
//! The JSON the client signs over (through its hash) in every ceremony.
//!
//! Spec: <https://www.w3.org/TR/webauthn-2/#dictionary-client-data>

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use webauthn_platform_ctap::error::{Result, WebAuthnError};
use webauthn_platform_ctap::types::base64url;

/// Ceremony the client data belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientDataType {
    #[serde(rename = "webauthn.create")]
    Create,
    #[serde(rename = "webauthn.get")]
    Get,
}

impl ClientDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "webauthn.create",
            Self::Get => "webauthn.get",
        }
    }
}

/// `CollectedClientData`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedClientData {
    #[serde(rename = "type")]
    pub ceremony: ClientDataType,
    /// base64url (no padding)
    pub challenge: String,
    pub origin: String,
}

impl CollectedClientData {
    /// Build client data for a relying party challenge
    ///
    /// The challenge string is transported as base64url of its UTF-8 bytes.
    pub fn new(ceremony: ClientDataType, challenge: &str, origin: impl Into<String>) -> Self {
        Self {
            ceremony,
            challenge: base64url::encode(challenge.as_bytes()),
            origin: origin.into(),
        }
    }

    /// Serialized JSON, exactly the bytes that get hashed
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| WebAuthnError::Encoding(e.to_string()))
    }

    pub fn from_json(json: &[u8]) -> Result<Self> {
        serde_json::from_slice(json).map_err(|e| WebAuthnError::Encoding(e.to_string()))
    }

    /// SHA-256 of `json`
    pub fn hash(json: &[u8]) -> [u8; 32] {
        Sha256::digest(json).into()
    }
}
