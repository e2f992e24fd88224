//! Attestation object for the "none" attestation statement format
//!
//! ```text
//! { "fmt": "none", "attStmt": {}, "authData": bytes }
//! ```
//!
//! Keys are emitted in CTAP2 canonical order (shorter keys first), which is the
//! field order of the serialized struct.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cbor::{self, Value};
use crate::error::{Result, WebAuthnError};

/// Attestation statement format identifier
pub const NONE_ATTESTATION_FORMAT: &str = "none";

/// Attestation object carrying no attestation statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoneAttestationObject {
    auth_data: Vec<u8>,
}

#[derive(Serialize)]
struct EncodedObject<'a> {
    fmt: &'a str,
    #[serde(rename = "attStmt")]
    att_stmt: EmptyStatement,
    #[serde(rename = "authData", with = "serde_bytes")]
    auth_data: &'a [u8],
}

#[derive(Serialize)]
struct EmptyStatement {}

#[derive(Deserialize)]
struct DecodedObject {
    fmt: String,
    #[serde(rename = "attStmt")]
    att_stmt: BTreeMap<String, Value>,
    #[serde(rename = "authData", with = "serde_bytes")]
    auth_data: Vec<u8>,
}

impl NoneAttestationObject {
    /// Wrap encoded authenticator data
    pub fn new(auth_data: Vec<u8>) -> Self {
        Self { auth_data }
    }

    pub fn fmt(&self) -> &'static str {
        NONE_ATTESTATION_FORMAT
    }

    /// Raw authenticator data bytes, exactly as wrapped
    pub fn auth_data(&self) -> &[u8] {
        &self.auth_data
    }

    pub fn into_auth_data(self) -> Vec<u8> {
        self.auth_data
    }

    /// Encode as a CBOR attestation object
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        cbor::encode(&EncodedObject {
            fmt: NONE_ATTESTATION_FORMAT,
            att_stmt: EmptyStatement {},
            auth_data: &self.auth_data,
        })
    }

    /// Decode a CBOR attestation object
    ///
    /// Anything other than a well-formed "none" object with an empty
    /// statement is rejected.
    pub fn from_cbor(data: &[u8]) -> Result<Self> {
        let decoded: DecodedObject = cbor::decode(data)?;

        if decoded.fmt != NONE_ATTESTATION_FORMAT {
            return Err(WebAuthnError::Encoding(format!(
                "unsupported attestation format: {}",
                decoded.fmt
            )));
        }
        if !decoded.att_stmt.is_empty() {
            return Err(WebAuthnError::Encoding(
                "none attestation must have an empty statement".to_string(),
            ));
        }

        Ok(Self::new(decoded.auth_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator_data::{AttestedCredentialData, AuthenticatorData};
    use crate::cose::Ec2CoseKey;
    use crate::extensions::AuthenticatorExtensionsOutput;
    use crate::types::CredentialId;
    use uuid::Uuid;

    #[test]
    fn test_encoding_layout() {
        let encoded = NoneAttestationObject::new(vec![0xde, 0xad]).to_cbor().unwrap();

        // {"fmt": "none", "attStmt": {}, "authData": h'dead'}
        let expected = hex::decode(concat!(
            "a3",
            "63666d74",
            "646e6f6e65",
            "6761747453746d74",
            "a0",
            "686175746844617461",
            "42dead"
        ))
        .unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_auth_data_survives_byte_exact() {
        let mut point = vec![0x04];
        point.extend_from_slice(&[0x42; 64]);
        let cases = [
            AuthenticatorData::new("example.com", 0),
            AuthenticatorData::new("example.com", u32::MAX).with_attested_credential_data(
                AttestedCredentialData::new(
                    Uuid::new_v4(),
                    CredentialId::generate(32),
                    Ec2CoseKey::from_uncompressed(&point).to_cbor().unwrap(),
                ),
            ),
            AuthenticatorData::new("example.com", 5).with_extensions(Some(
                AuthenticatorExtensionsOutput {
                    cred_protect: Some(2),
                },
            )),
        ];

        for data in cases {
            let bytes = data.to_bytes().unwrap();
            let object = NoneAttestationObject::new(bytes.clone());
            let decoded = NoneAttestationObject::from_cbor(&object.to_cbor().unwrap()).unwrap();
            assert_eq!(decoded.auth_data(), &bytes[..]);
        }
    }

    #[test]
    fn test_rejects_other_format() {
        #[derive(Serialize)]
        struct Packed<'a> {
            fmt: &'a str,
            #[serde(rename = "attStmt")]
            att_stmt: EmptyStatement,
            #[serde(rename = "authData", with = "serde_bytes")]
            auth_data: &'a [u8],
        }

        let packed = cbor::encode(&Packed {
            fmt: "packed",
            att_stmt: EmptyStatement {},
            auth_data: &[1, 2, 3],
        })
        .unwrap();

        assert!(matches!(
            NoneAttestationObject::from_cbor(&packed),
            Err(WebAuthnError::Encoding(msg)) if msg.contains("packed")
        ));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(NoneAttestationObject::from_cbor(&[]).is_err());
        assert!(NoneAttestationObject::from_cbor(&[0xa1, 0x63]).is_err());
        // map without authData
        assert!(NoneAttestationObject::from_cbor(&hex::decode("a163666d74646e6f6e65").unwrap()).is_err());
    }
}
