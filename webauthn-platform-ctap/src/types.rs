//! WebAuthn data types shared by the authenticator and the client layer
//!
//! Binary fields (credential ids, user handles) serialize as base64url strings
//! in human-readable formats such as JSON and as byte strings in CBOR.

use core::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The only credential type defined by WebAuthn Level 2
pub const PUBLIC_KEY_TYPE: &str = "public-key";

/// Base64url (no padding) helpers and serde adapters
pub mod base64url {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Encode bytes as unpadded base64url
    pub fn encode(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decode unpadded base64url
    pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(text)
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            decode(&text).map_err(de::Error::custom)
        } else {
            serde_bytes::ByteBuf::deserialize(deserializer).map(serde_bytes::ByteBuf::into_vec)
        }
    }

    /// Same encoding for `Option<Vec<u8>>` fields
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] Vec<u8>);

            Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
        }
    }
}

/// Opaque credential identifier
///
/// Generated randomly by the authenticator on every registration. Displays
/// as base64url, which is also the form relying parties exchange it in.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(#[serde(with = "base64url")] Vec<u8>);

impl CredentialId {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Generate a random credential id of `len` bytes
    pub fn generate(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_base64url(text: &str) -> Result<Self, base64::DecodeError> {
        base64url::decode(text).map(Self)
    }

    pub fn to_base64url(&self) -> String {
        base64url::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for CredentialId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for CredentialId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for CredentialId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64url())
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId({})", self.to_base64url())
    }
}

/// Relying party entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialRpEntity {
    /// Relying party identifier (e.g., "example.com"); hashed into authenticator data
    pub id: String,

    /// Human-readable name
    pub name: String,
}

impl PublicKeyCredentialRpEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// User account entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialUserEntity {
    /// User handle, 1 to 64 bytes
    #[serde(with = "base64url")]
    pub id: Vec<u8>,

    pub name: String,

    pub display_name: String,
}

impl PublicKeyCredentialUserEntity {
    pub fn new(id: impl Into<Vec<u8>>, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: display_name.into(),
        }
    }
}

/// Public key credential descriptor
///
/// Identifies a credential by its type and ID in exclude and allow lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialDescriptor {
    #[serde(rename = "type")]
    pub cred_type: String,

    pub id: CredentialId,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

impl PublicKeyCredentialDescriptor {
    /// Create a "public-key" descriptor without transport hints
    pub fn new(id: CredentialId) -> Self {
        Self {
            cred_type: PUBLIC_KEY_TYPE.to_string(),
            id,
            transports: Vec::new(),
        }
    }

    pub fn with_transports(mut self, transports: Vec<String>) -> Self {
        self.transports = transports;
        self
    }
}

/// Public key credential parameters
///
/// One entry of the relying party's acceptable (type, algorithm) list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialParameters {
    #[serde(rename = "type")]
    pub cred_type: String,

    /// COSE algorithm identifier
    pub alg: i32,
}

impl PublicKeyCredentialParameters {
    pub fn new(alg: i32) -> Self {
        Self {
            cred_type: PUBLIC_KEY_TYPE.to_string(),
            alg,
        }
    }
}

/// Credential source record
///
/// Persisted by the credential source store, one per registered credential.
/// The private key itself lives in the key store under the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialSource {
    pub id: CredentialId,

    #[serde(rename = "type")]
    pub cred_type: String,

    pub aaguid: Uuid,

    #[serde(default, with = "base64url::option", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Vec<u8>>,

    pub rp_id: String,

    /// Signature counter, starts at 0
    pub sign_count: u32,
}

impl PublicKeyCredentialSource {
    pub fn new(
        id: CredentialId,
        aaguid: Uuid,
        rp_id: impl Into<String>,
        user_id: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            cred_type: PUBLIC_KEY_TYPE.to_string(),
            aaguid,
            user_id,
            rp_id: rp_id.into(),
            sign_count: 0,
        }
    }

    /// Whether this source belongs to the given account at the given relying party
    pub fn is_bound_to(&self, rp_id: &str, user_id: &[u8]) -> bool {
        self.rp_id == rp_id && self.user_id.as_deref() == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_id_base64url() {
        let id = CredentialId::new(vec![0xfb, 0xff, 0x00, 0x01]);
        assert_eq!(id.to_base64url(), "-_8AAQ");
        assert_eq!(id.to_string(), "-_8AAQ");
        assert_eq!(CredentialId::from_base64url("-_8AAQ").unwrap(), id);
    }

    #[test]
    fn test_credential_id_generate() {
        let a = CredentialId::generate(32);
        let b = CredentialId::generate(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_source_json_shape() {
        let source = PublicKeyCredentialSource::new(
            CredentialId::new(vec![1, 2, 3]),
            Uuid::nil(),
            "example.com",
            Some(b"user".to_vec()),
        );

        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["id"], "AQID");
        assert_eq!(json["type"], "public-key");
        assert_eq!(json["userId"], "dXNlcg");
        assert_eq!(json["rpId"], "example.com");
        assert_eq!(json["signCount"], 0);

        let back: PublicKeyCredentialSource = serde_json::from_value(json).unwrap();
        assert_eq!(back, source);
    }

    #[test]
    fn test_source_binding() {
        let source = PublicKeyCredentialSource::new(
            CredentialId::new(vec![9]),
            Uuid::nil(),
            "example.com",
            Some(b"alice".to_vec()),
        );

        assert!(source.is_bound_to("example.com", b"alice"));
        assert!(!source.is_bound_to("example.com", b"bob"));
        assert!(!source.is_bound_to("other.com", b"alice"));
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = PublicKeyCredentialDescriptor::new(CredentialId::new(vec![7]));
        assert_eq!(descriptor.cred_type, PUBLIC_KEY_TYPE);
        assert!(descriptor.transports.is_empty());

        let json = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(json, r#"{"type":"public-key","id":"Bw"}"#);
    }
}
