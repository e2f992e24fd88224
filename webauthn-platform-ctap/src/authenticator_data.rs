//! Authenticator data and attested credential data
//!
//! Byte layout (<https://www.w3.org/TR/webauthn-2/#sctn-authenticator-data>):
//!
//! ```text
//! rpIdHash (32) | flags (1) | signCount (4, BE) | attestedCredentialData? | extensions?
//!
//! attestedCredentialData:
//! aaguid (16) | credentialIdLength (2, BE) | credentialId | credentialPublicKey (COSE)
//! ```
//!
//! The AT and ED flag bits are computed from the presence of the optional
//! parts when encoding and are never stored separately.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::cbor;
use crate::error::{Result, WebAuthnError};
use crate::extensions::AuthenticatorExtensionsOutput;
use crate::types::CredentialId;

/// Flag bits
pub mod flags {
    /// User present
    pub const UP: u8 = 0x01;
    /// User verified
    pub const UV: u8 = 0x04;
    /// Attested credential data included
    pub const AT: u8 = 0x40;
    /// Extension data included
    pub const ED: u8 = 0x80;
}

pub const RP_ID_HASH_LEN: usize = 32;
const FLAGS_LEN: usize = 1;
const SIGN_COUNT_LEN: usize = 4;
const AAGUID_LEN: usize = 16;
const CREDENTIAL_ID_LENGTH_LEN: usize = 2;
const HEADER_LEN: usize = RP_ID_HASH_LEN + FLAGS_LEN + SIGN_COUNT_LEN;

/// SHA-256 of the relying party id
pub fn rp_id_hash(rp_id: &str) -> [u8; RP_ID_HASH_LEN] {
    Sha256::digest(rp_id.as_bytes()).into()
}

/// Attested credential data, only present in registration responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    pub aaguid: Uuid,
    pub credential_id: CredentialId,
    /// CBOR-encoded COSE public key
    pub public_key: Vec<u8>,
}

impl AttestedCredentialData {
    pub fn new(aaguid: Uuid, credential_id: CredentialId, public_key: Vec<u8>) -> Self {
        Self {
            aaguid,
            credential_id,
            public_key,
        }
    }

    /// Encode to bytes
    ///
    /// Fails if the credential id does not fit the 16-bit length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let id_len = u16::try_from(self.credential_id.len()).map_err(|_| {
            WebAuthnError::Encoding(format!(
                "credential id is {} bytes, at most {} are supported",
                self.credential_id.len(),
                u16::MAX
            ))
        })?;

        let mut out = Vec::with_capacity(
            AAGUID_LEN + CREDENTIAL_ID_LENGTH_LEN + self.credential_id.len() + self.public_key.len(),
        );
        out.extend_from_slice(self.aaguid.as_bytes());
        out.extend_from_slice(&id_len.to_be_bytes());
        out.extend_from_slice(self.credential_id.as_bytes());
        out.extend_from_slice(&self.public_key);
        Ok(out)
    }

    /// Parse from the front of `data`, returning the number of bytes consumed
    fn parse(data: &[u8]) -> Result<(Self, usize)> {
        let aaguid = data.get(..AAGUID_LEN).ok_or_else(|| truncated("aaguid"))?;
        let aaguid = Uuid::from_slice(aaguid).map_err(|e| WebAuthnError::Encoding(e.to_string()))?;

        let mut pos = AAGUID_LEN;
        let len_bytes = data
            .get(pos..pos + CREDENTIAL_ID_LENGTH_LEN)
            .ok_or_else(|| truncated("credential id length"))?;
        let id_len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
        pos += CREDENTIAL_ID_LENGTH_LEN;

        let credential_id = data
            .get(pos..pos + id_len)
            .ok_or_else(|| truncated("credential id"))?;
        pos += id_len;

        let key_len = cbor::item_len(&data[pos..])?;
        let public_key = data[pos..pos + key_len].to_vec();
        pos += key_len;

        Ok((Self::new(aaguid, credential_id.into(), public_key), pos))
    }
}

/// Authenticator data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; RP_ID_HASH_LEN],
    pub user_present: bool,
    pub user_verified: bool,
    pub sign_count: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    pub extensions: Option<AuthenticatorExtensionsOutput>,
}

impl AuthenticatorData {
    /// Authenticator data for `rp_id` with user present and verified set
    ///
    /// A platform authenticator always verifies the user locally before it
    /// produces authenticator data.
    pub fn new(rp_id: &str, sign_count: u32) -> Self {
        Self {
            rp_id_hash: rp_id_hash(rp_id),
            user_present: true,
            user_verified: true,
            sign_count,
            attested_credential_data: None,
            extensions: None,
        }
    }

    pub fn with_attested_credential_data(mut self, data: AttestedCredentialData) -> Self {
        self.attested_credential_data = Some(data);
        self
    }

    pub fn with_extensions(mut self, extensions: Option<AuthenticatorExtensionsOutput>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Flags byte derived from the current field values
    pub fn flags(&self) -> u8 {
        let mut value = 0;
        if self.user_present {
            value |= flags::UP;
        }
        if self.user_verified {
            value |= flags::UV;
        }
        if self.attested_credential_data.is_some() {
            value |= flags::AT;
        }
        if self.extensions.is_some() {
            value |= flags::ED;
        }
        value
    }

    /// Encode to the authenticator data byte layout
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.rp_id_hash);
        out.push(self.flags());
        out.extend_from_slice(&self.sign_count.to_be_bytes());

        if let Some(attested) = &self.attested_credential_data {
            out.extend_from_slice(&attested.to_bytes()?);
        }
        if let Some(extensions) = &self.extensions {
            out.extend_from_slice(&extensions.to_cbor()?);
        }
        Ok(out)
    }

    /// Decode authenticator data bytes
    ///
    /// Trailing bytes after the last announced part are rejected.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(truncated("header"));
        }

        let mut rp_id_hash = [0u8; RP_ID_HASH_LEN];
        rp_id_hash.copy_from_slice(&data[..RP_ID_HASH_LEN]);
        let flag_byte = data[RP_ID_HASH_LEN];
        let sign_count = u32::from_be_bytes([
            data[RP_ID_HASH_LEN + 1],
            data[RP_ID_HASH_LEN + 2],
            data[RP_ID_HASH_LEN + 3],
            data[RP_ID_HASH_LEN + 4],
        ]);

        let mut pos = HEADER_LEN;
        let attested_credential_data = if flag_byte & flags::AT != 0 {
            let (attested, used) = AttestedCredentialData::parse(&data[pos..])?;
            pos += used;
            Some(attested)
        } else {
            None
        };

        let extensions = if flag_byte & flags::ED != 0 {
            let len = cbor::item_len(&data[pos..])?;
            let extensions = AuthenticatorExtensionsOutput::from_cbor(&data[pos..pos + len])?;
            pos += len;
            Some(extensions)
        } else {
            None
        };

        if pos != data.len() {
            return Err(WebAuthnError::Encoding(format!(
                "{} trailing bytes after authenticator data",
                data.len() - pos
            )));
        }

        Ok(Self {
            rp_id_hash,
            user_present: flag_byte & flags::UP != 0,
            user_verified: flag_byte & flags::UV != 0,
            sign_count,
            attested_credential_data,
            extensions,
        })
    }
}

fn truncated(part: &str) -> WebAuthnError {
    WebAuthnError::Encoding(format!("authenticator data truncated in {part}"))
}
