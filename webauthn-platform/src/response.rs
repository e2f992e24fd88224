//! Ceremony results
//!
//! What the client hands back to the relying party for verification, and the
//! WebAuthn JSON shape they travel in.

use serde::Serialize;

use webauthn_platform_ctap::attestation::NoneAttestationObject;
use webauthn_platform_ctap::authenticator_data::AuthenticatorData;
use webauthn_platform_ctap::error::{Result, WebAuthnError};
use webauthn_platform_ctap::extensions::ClientExtensionsOutput;
use webauthn_platform_ctap::types::{CredentialId, PUBLIC_KEY_TYPE, base64url};

use crate::client_data::CollectedClientData;

/// Result of a registration ceremony
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyCredentialCreateResult {
    pub id: CredentialId,
    pub client_data_json: Vec<u8>,
    /// CBOR "none" attestation object
    pub attestation_object: Vec<u8>,
    pub client_extension_results: Option<ClientExtensionsOutput>,
}

impl PublicKeyCredentialCreateResult {
    pub fn client_data(&self) -> Result<CollectedClientData> {
        CollectedClientData::from_json(&self.client_data_json)
    }

    /// Decode the authenticator data carried by the attestation object
    pub fn authenticator_data(&self) -> Result<AuthenticatorData> {
        let object = NoneAttestationObject::from_cbor(&self.attestation_object)?;
        AuthenticatorData::parse(object.auth_data())
    }

    /// `PublicKeyCredential` JSON with an `AuthenticatorAttestationResponse`
    pub fn to_json(&self) -> Result<String> {
        to_json(&CredentialJson {
            id: self.id.to_base64url(),
            raw_id: self.id.to_base64url(),
            cred_type: PUBLIC_KEY_TYPE,
            response: AttestationResponseJson {
                client_data_json: base64url::encode(&self.client_data_json),
                attestation_object: base64url::encode(&self.attestation_object),
            },
            client_extension_results: self.client_extension_results.clone().unwrap_or_default(),
        })
    }
}

/// Result of an authentication ceremony
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyCredentialGetResult {
    pub id: CredentialId,
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    /// DER signature over `authenticator_data || SHA-256(client_data_json)`
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
    pub client_extension_results: Option<ClientExtensionsOutput>,
}

impl PublicKeyCredentialGetResult {
    pub fn client_data(&self) -> Result<CollectedClientData> {
        CollectedClientData::from_json(&self.client_data_json)
    }

    /// The bytes the signature covers
    pub fn signed_data(&self) -> Vec<u8> {
        let mut signed = self.authenticator_data.clone();
        signed.extend_from_slice(&CollectedClientData::hash(&self.client_data_json));
        signed
    }

    /// `PublicKeyCredential` JSON with an `AuthenticatorAssertionResponse`
    pub fn to_json(&self) -> Result<String> {
        to_json(&CredentialJson {
            id: self.id.to_base64url(),
            raw_id: self.id.to_base64url(),
            cred_type: PUBLIC_KEY_TYPE,
            response: AssertionResponseJson {
                client_data_json: base64url::encode(&self.client_data_json),
                authenticator_data: base64url::encode(&self.authenticator_data),
                signature: base64url::encode(&self.signature),
                user_handle: self.user_handle.as_deref().map(base64url::encode),
            },
            client_extension_results: self.client_extension_results.clone().unwrap_or_default(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialJson<R> {
    id: String,
    raw_id: String,
    #[serde(rename = "type")]
    cred_type: &'static str,
    response: R,
    client_extension_results: ClientExtensionsOutput,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttestationResponseJson {
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
    attestation_object: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssertionResponseJson {
    #[serde(rename = "clientDataJSON")]
    client_data_json: String,
    authenticator_data: String,
    signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_handle: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| WebAuthnError::Encoding(e.to_string()))
}
