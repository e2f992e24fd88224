//! Platform authenticator kinds and their AAGUIDs

use core::fmt;

use uuid::Uuid;

const BIOMETRIC_AAGUID: Uuid = Uuid::from_u128(0x4e3db665_c12d_5d2d_6a09_a15b78972bc9);
const DEVICE_CREDENTIAL_AAGUID: Uuid = Uuid::from_u128(0x5c7b7e9a_2b85_464e_9ea3_529582bb7e34);

/// Kind of local user verification backing an authenticator
///
/// Each kind maps to exactly one AAGUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticatorType {
    /// Biometrics only (fingerprint, face)
    Biometric,
    /// Biometrics with fallback to the device passcode
    DeviceCredential,
}

impl AuthenticatorType {
    pub const ALL: [AuthenticatorType; 2] = [Self::Biometric, Self::DeviceCredential];

    pub fn aaguid(self) -> Uuid {
        match self {
            Self::Biometric => BIOMETRIC_AAGUID,
            Self::DeviceCredential => DEVICE_CREDENTIAL_AAGUID,
        }
    }

    /// Reverse lookup; `None` for AAGUIDs this crate does not issue
    pub fn from_aaguid(aaguid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.aaguid() == *aaguid)
    }
}

impl fmt::Display for AuthenticatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Biometric => f.write_str("biometric"),
            Self::DeviceCredential => f.write_str("device-credential"),
        }
    }
}
