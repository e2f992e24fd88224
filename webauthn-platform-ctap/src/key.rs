//! Credential private keys
//!
//! A [`PrivateKey`] is the handle the key store persists per credential id.
//! The scalar lives in a `SecVec` (mlocked, zeroed on drop) and never appears
//! in `Debug` output.

use core::fmt;

use secstr::SecVec;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use webauthn_platform_crypto::ecdsa;

use crate::cose::CoseAlgorithm;
use crate::error::{Result, WebAuthnError};

/// Credential private key
#[derive(Clone)]
pub struct PrivateKey {
    algorithm: CoseAlgorithm,
    secret: SecVec<u8>,
}

impl PrivateKey {
    /// Generate a key pair for `algorithm`
    ///
    /// Returns the private key and the uncompressed public point.
    pub fn generate(algorithm: CoseAlgorithm) -> Result<(Self, Vec<u8>)> {
        match algorithm {
            CoseAlgorithm::Es256 => {
                let (secret, public_key) = ecdsa::generate_keypair();
                let secret = Zeroizing::new(secret);
                Ok((
                    Self {
                        algorithm,
                        secret: SecVec::new(secret.to_vec()),
                    },
                    public_key.to_vec(),
                ))
            }
            other => Err(unsupported(other)),
        }
    }

    /// Restore a key from its raw secret, e.g. when loading from a backend
    pub fn from_bytes(algorithm: CoseAlgorithm, secret: &[u8]) -> Result<Self> {
        match algorithm {
            CoseAlgorithm::Es256 => {
                // Reject scalars p256 would refuse to sign with
                ecdsa::public_key(secret)?;
                Ok(Self {
                    algorithm,
                    secret: SecVec::new(secret.to_vec()),
                })
            }
            other => Err(unsupported(other)),
        }
    }

    pub fn algorithm(&self) -> CoseAlgorithm {
        self.algorithm
    }

    /// Raw secret bytes, for key store backends that persist them
    pub fn expose_secret(&self) -> &[u8] {
        self.secret.unsecure()
    }

    /// Uncompressed public point
    pub fn public_key(&self) -> Result<Vec<u8>> {
        match self.algorithm {
            CoseAlgorithm::Es256 => Ok(ecdsa::public_key(self.secret.unsecure())?.to_vec()),
            other => Err(unsupported(other)),
        }
    }

    /// Sign `data` with the algorithm implied by the key type
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.algorithm {
            CoseAlgorithm::Es256 => Ok(ecdsa::sign(self.secret.unsecure(), data)?),
            other => Err(unsupported(other)),
        }
    }
}

fn unsupported(algorithm: CoseAlgorithm) -> WebAuthnError {
    WebAuthnError::SecKey {
        cause: format!("Given key type is not currently supported: {algorithm}"),
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && bool::from(self.secret.unsecure().ct_eq(other.secret.unsecure()))
    }
}

impl Eq for PrivateKey {}
