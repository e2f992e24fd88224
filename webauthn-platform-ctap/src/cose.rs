//! COSE algorithm identifiers and EC2 public keys
//!
//! See RFC 9053 section 7.1 and the WebAuthn "credentialPublicKey" definition:
//! <https://www.w3.org/TR/webauthn-2/#sctn-encoded-credPubKey-examples>

use core::fmt;

use webauthn_platform_crypto::ecdsa::UNCOMPRESSED_POINT_LEN;

use crate::cbor::{MapBuilder, MapParser};
use crate::error::{Result, WebAuthnError};

/// COSE key map labels
mod labels {
    pub const KTY: i32 = 1;
    pub const ALG: i32 = 3;
    pub const CRV: i32 = -1;
    pub const X: i32 = -2;
    pub const Y: i32 = -3;
}

/// COSE key type: Elliptic Curve with x and y coordinates
pub const KTY_EC2: i32 = 2;

/// COSE elliptic curve: NIST P-256
pub const CRV_P256: i32 = 1;

const COORDINATE_LEN: usize = 32;

/// COSE signature algorithms a relying party may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoseAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-1
    Rs1,
    Rs256,
    Rs384,
    Rs512,
    /// RSASSA-PSS with SHA-256
    Ps256,
    Ps384,
    Ps512,
    EdDsa,
    /// ECDSA P-256 with SHA-256
    Es256,
    Es384,
    Es512,
    /// ECDSA secp256k1 with SHA-256
    Es256K,
}

impl CoseAlgorithm {
    pub const ALL: [CoseAlgorithm; 12] = [
        Self::Rs1,
        Self::Rs256,
        Self::Rs384,
        Self::Rs512,
        Self::Ps256,
        Self::Ps384,
        Self::Ps512,
        Self::EdDsa,
        Self::Es256,
        Self::Es384,
        Self::Es512,
        Self::Es256K,
    ];

    pub fn to_i32(self) -> i32 {
        match self {
            Self::Rs1 => -65535,
            Self::Rs256 => -257,
            Self::Rs384 => -258,
            Self::Rs512 => -259,
            Self::Ps256 => -37,
            Self::Ps384 => -38,
            Self::Ps512 => -39,
            Self::EdDsa => -8,
            Self::Es256 => -7,
            Self::Es384 => -35,
            Self::Es512 => -36,
            Self::Es256K => -43,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.to_i32() == value)
    }
}

impl fmt::Display for CoseAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rs1 => "RS1",
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Ps256 => "PS256",
            Self::Ps384 => "PS384",
            Self::Ps512 => "PS512",
            Self::EdDsa => "EdDSA",
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
            Self::Es512 => "ES512",
            Self::Es256K => "ES256K",
        };
        write!(f, "{name} ({})", self.to_i32())
    }
}

/// EC2 COSE public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2CoseKey {
    pub kty: i32,
    pub alg: i32,
    pub crv: i32,
    pub x: [u8; COORDINATE_LEN],
    pub y: [u8; COORDINATE_LEN],
}

impl Ec2CoseKey {
    /// Build an ES256 key from an uncompressed SEC1 point (`0x04 || x || y`)
    ///
    /// # Panics
    ///
    /// Panics if `public_key` is not 65 bytes starting with `0x04`. Key
    /// generation only ever produces uncompressed points, so anything else is
    /// a caller bug.
    pub fn from_uncompressed(public_key: &[u8]) -> Self {
        assert_eq!(
            public_key.len(),
            UNCOMPRESSED_POINT_LEN,
            "public key must be 65 bytes"
        );
        assert_eq!(public_key[0], 0x04, "public key must be uncompressed");

        let mut x = [0u8; COORDINATE_LEN];
        let mut y = [0u8; COORDINATE_LEN];
        x.copy_from_slice(&public_key[1..33]);
        y.copy_from_slice(&public_key[33..]);

        Self {
            kty: KTY_EC2,
            alg: CoseAlgorithm::Es256.to_i32(),
            crv: CRV_P256,
            x,
            y,
        }
    }

    /// Rebuild the uncompressed SEC1 point
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_POINT_LEN] {
        let mut point = [0u8; UNCOMPRESSED_POINT_LEN];
        point[0] = 0x04;
        point[1..33].copy_from_slice(&self.x);
        point[33..].copy_from_slice(&self.y);
        point
    }

    /// Encode as a canonical CBOR map {1: kty, 3: alg, -1: crv, -2: x, -3: y}
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        MapBuilder::new()
            .insert(labels::KTY, self.kty)?
            .insert(labels::ALG, self.alg)?
            .insert(labels::CRV, self.crv)?
            .insert_bytes(labels::X, &self.x)?
            .insert_bytes(labels::Y, &self.y)?
            .build()
    }

    /// Parse an EC2 key map
    pub fn from_cbor(data: &[u8]) -> Result<Self> {
        let parser = MapParser::from_bytes(data)?;

        let kty = int_label(&parser, labels::KTY)?;
        if kty != KTY_EC2 {
            return Err(WebAuthnError::Encoding(format!(
                "unexpected COSE key type {kty}"
            )));
        }

        Ok(Self {
            kty,
            alg: int_label(&parser, labels::ALG)?,
            crv: int_label(&parser, labels::CRV)?,
            x: coordinate(&parser, labels::X)?,
            y: coordinate(&parser, labels::Y)?,
        })
    }
}

fn int_label(parser: &MapParser, label: i32) -> Result<i32> {
    let value = parser.get_int(label)?;
    i32::try_from(value)
        .map_err(|_| WebAuthnError::Encoding(format!("COSE label {label} out of range")))
}

fn coordinate(parser: &MapParser, label: i32) -> Result<[u8; COORDINATE_LEN]> {
    parser
        .get_bytes(label)?
        .try_into()
        .map_err(|_| WebAuthnError::Encoding(format!("COSE coordinate {label} must be 32 bytes")))
}
