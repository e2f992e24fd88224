//! P-256 ECDSA (ES256) for credential key pairs and assertion signatures
//!
//! COSE algorithm identifier: -7 (ES256)
//! Spec: <https://www.rfc-editor.org/rfc/rfc8152.html#section-8.1>
//!
//! Private keys travel as 32-byte big-endian scalars, public keys as 65-byte
//! uncompressed SEC1 points (`0x04 || x || y`). Signatures are DER encoded, which
//! is what WebAuthn relying parties expect in an assertion response.

use p256::ecdsa::{Signature, SigningKey, VerifyingKey, signature::Signer, signature::Verifier};
use rand::rngs::OsRng;

use crate::error::{CryptoError, Result};

/// Length of a P-256 private scalar
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of an uncompressed SEC1 P-256 point
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Generate a fresh ES256 key pair
///
/// Returns `(private_key, public_key)`: the 32-byte scalar and the 65-byte
/// uncompressed point.
///
/// # Examples
///
/// ```
/// use webauthn_platform_crypto::ecdsa;
///
/// let (private_key, public_key) = ecdsa::generate_keypair();
/// assert_eq!(private_key.len(), 32);
/// assert_eq!(public_key[0], 0x04);
/// ```
pub fn generate_keypair() -> ([u8; PRIVATE_KEY_LEN], [u8; UNCOMPRESSED_POINT_LEN]) {
    let signing_key = SigningKey::random(&mut OsRng);
    let private_key: [u8; PRIVATE_KEY_LEN] = signing_key.to_bytes().into();
    (private_key, encode_point(signing_key.verifying_key()))
}

/// Sign `data` with ES256
///
/// The message is hashed with SHA-256 by the signer; pass the raw
/// `authenticatorData || clientDataHash` concatenation, not a digest.
///
/// # Arguments
///
/// * `private_key` - 32-byte private scalar
/// * `data` - Message to sign
///
/// # Returns
///
/// DER-encoded ECDSA signature (70-72 bytes in practice)
pub fn sign(private_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let signing_key = signing_key(private_key)?;
    let signature: Signature = signing_key.sign(data);
    Ok(signature.to_der().as_bytes().to_vec())
}

/// Verify a DER-encoded ES256 signature
///
/// # Examples
///
/// ```
/// use webauthn_platform_crypto::ecdsa;
///
/// let (private_key, public_key) = ecdsa::generate_keypair();
/// let signature = ecdsa::sign(&private_key, b"authData").unwrap();
///
/// assert!(ecdsa::verify(&public_key, b"authData", &signature).is_ok());
/// assert!(ecdsa::verify(&public_key, b"tampered", &signature).is_err());
/// ```
pub fn verify(public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<()> {
    let verifying_key =
        VerifyingKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let signature = Signature::from_der(signature).map_err(|_| CryptoError::InvalidSignature)?;

    verifying_key
        .verify(data, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

/// Derive the uncompressed public point for a private scalar
pub fn public_key(private_key: &[u8]) -> Result<[u8; UNCOMPRESSED_POINT_LEN]> {
    let signing_key = signing_key(private_key)?;
    Ok(encode_point(signing_key.verifying_key()))
}

fn signing_key(private_key: &[u8]) -> Result<SigningKey> {
    if private_key.len() != PRIVATE_KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: PRIVATE_KEY_LEN,
            actual: private_key.len(),
        });
    }
    SigningKey::from_slice(private_key).map_err(|_| CryptoError::InvalidPrivateKey)
}

fn encode_point(verifying_key: &VerifyingKey) -> [u8; UNCOMPRESSED_POINT_LEN] {
    let point = verifying_key.to_encoded_point(false);
    let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
    out.copy_from_slice(point.as_bytes());
    out
}
