//! Common test utilities for webauthn-platform integration tests
//!
//! In-memory collaborators with injectable failures, shared by the
//! authenticator and credential tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use webauthn_platform::ctap::authenticator_data::AuthenticatorData;
use webauthn_platform::ctap::cose::Ec2CoseKey;
use webauthn_platform::{
    AttestationConveyancePreference, AuthenticatorAttachment, AuthenticatorSelectionCriteria,
    ClientExtensionsInput, CoseAlgorithm, CredentialId, CredentialSourceStore, KeyStorageError, KeyStore,
    LocalAuthenticator, PrivateKey, PublicKeyCredential, PublicKeyCredentialCreateResult,
    PublicKeyCredentialCreationOptions, PublicKeyCredentialDescriptor,
    PublicKeyCredentialGetResult, PublicKeyCredentialParameters, PublicKeyCredentialRequestOptions,
    PublicKeyCredentialRpEntity, PublicKeyCredentialSource, PublicKeyCredentialUserEntity,
    RelyingParty, UserVerificationError, UserVerificationRequirement,
};

pub const RP_ID: &str = "test.service.com";
pub const RP_NAME: &str = "ios:test-service";
pub const USER_ID: &[u8] = b"ios:test-user-id";
pub const CREATION_CHALLENGE: &str = "ios:test-challenge-creation";
pub const ASSERTION_CHALLENGE: &str = "ios:test-challenge-assertion";
pub const ORIGIN: &str = "ios:bundle-id:com.example.webauthn";

/// Status reported by failing key store operations
pub const KEY_STORE_FAILURE_STATUS: i32 = -67671;

/// Key store operation to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFault {
    Store,
    Load,
    Delete,
}

/// In-memory key store
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: Mutex<HashMap<CredentialId, PrivateKey>>,
    faults: Mutex<HashSet<KeyFault>>,
    delete_calls: AtomicUsize,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(self, fault: KeyFault) -> Self {
        self.fail(fault);
        self
    }

    pub fn fail(&self, fault: KeyFault) {
        self.faults.lock().unwrap().insert(fault);
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    pub fn contains(&self, id: &CredentialId) -> bool {
        self.keys.lock().unwrap().contains_key(id)
    }

    /// Remove every key behind the engine's back
    pub fn clear(&self) {
        self.keys.lock().unwrap().clear();
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn faulty(&self, fault: KeyFault) -> bool {
        self.faults.lock().unwrap().contains(&fault)
    }
}

impl KeyStore for MemoryKeyStore {
    fn store(&self, id: &CredentialId, key: &PrivateKey) -> Result<(), KeyStorageError> {
        if self.faulty(KeyFault::Store) {
            return Err(KeyStorageError::StoreFailed {
                status: KEY_STORE_FAILURE_STATUS,
            });
        }
        self.keys.lock().unwrap().insert(id.clone(), key.clone());
        Ok(())
    }

    fn load(&self, id: &CredentialId) -> Result<Option<PrivateKey>, KeyStorageError> {
        if self.faulty(KeyFault::Load) {
            return Err(KeyStorageError::LoadFailed {
                status: KEY_STORE_FAILURE_STATUS,
            });
        }
        Ok(self.keys.lock().unwrap().get(id).cloned())
    }

    fn delete(&self, id: &CredentialId) -> Result<(), KeyStorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.faulty(KeyFault::Delete) {
            return Err(KeyStorageError::DeleteFailed {
                status: KEY_STORE_FAILURE_STATUS,
            });
        }
        self.keys.lock().unwrap().remove(id);
        Ok(())
    }
}

/// Credential source store operation to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFault {
    Load,
    LoadAll,
    Store,
    Delete,
    IncreaseCounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MockStoreError {
    #[error("load failed")]
    LoadFailed,
    #[error("load all failed")]
    LoadAllFailed,
    #[error("store failed")]
    StoreFailed,
    #[error("delete failed")]
    DeleteFailed,
    #[error("increase signature counter failed")]
    IncreaseSignatureCounterFailed,
    #[error("item not found")]
    ItemNotFound,
}

/// In-memory credential source store
#[derive(Default)]
pub struct MemorySourceStore {
    sources: Mutex<HashMap<CredentialId, PublicKeyCredentialSource>>,
    faults: Mutex<HashSet<SourceFault>>,
    delete_calls: AtomicUsize,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(self, fault: SourceFault) -> Self {
        self.fail(fault);
        self
    }

    pub fn fail(&self, fault: SourceFault) {
        self.faults.lock().unwrap().insert(fault);
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.sources.lock().unwrap().len()
    }

    pub fn get(&self, id: &CredentialId) -> Option<PublicKeyCredentialSource> {
        self.sources.lock().unwrap().get(id).cloned()
    }

    pub fn all(&self) -> Vec<PublicKeyCredentialSource> {
        self.sources.lock().unwrap().values().cloned().collect()
    }

    pub fn insert(&self, source: PublicKeyCredentialSource) {
        self.sources.lock().unwrap().insert(source.id.clone(), source);
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check(&self, fault: SourceFault, err: MockStoreError) -> Result<(), MockStoreError> {
        if self.faults.lock().unwrap().contains(&fault) {
            Err(err)
        } else {
            Ok(())
        }
    }
}

impl CredentialSourceStore for MemorySourceStore {
    type Error = MockStoreError;

    fn load(&self, id: &CredentialId) -> Result<Option<PublicKeyCredentialSource>, Self::Error> {
        self.check(SourceFault::Load, MockStoreError::LoadFailed)?;
        Ok(self.get(id))
    }

    fn load_all(&self) -> Result<Vec<PublicKeyCredentialSource>, Self::Error> {
        self.check(SourceFault::LoadAll, MockStoreError::LoadAllFailed)?;
        Ok(self.all())
    }

    fn store(&self, source: &PublicKeyCredentialSource) -> Result<(), Self::Error> {
        self.check(SourceFault::Store, MockStoreError::StoreFailed)?;
        let mut source = source.clone();
        source.sign_count = 0;
        self.insert(source);
        Ok(())
    }

    fn delete(&self, id: &CredentialId) -> Result<(), Self::Error> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check(SourceFault::Delete, MockStoreError::DeleteFailed)?;
        self.sources.lock().unwrap().remove(id);
        Ok(())
    }

    fn increase_signature_counter(&self, id: &CredentialId) -> Result<u32, Self::Error> {
        self.check(SourceFault::IncreaseCounter, MockStoreError::IncreaseSignatureCounterFailed)?;
        let mut sources = self.sources.lock().unwrap();
        let source = sources.get_mut(id).ok_or(MockStoreError::ItemNotFound)?;
        source.sign_count += 1;
        Ok(source.sign_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MockLocalAuthError {
    #[error("user cancelled")]
    UserCancel,
}

/// Outcome the scripted prompt reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Rejected,
    Unavailable,
    Cancelled,
}

/// Local authenticator answering every prompt with a fixed verdict
pub struct ScriptedLocalAuthenticator {
    verdict: Mutex<Verdict>,
    calls: AtomicUsize,
}

impl ScriptedLocalAuthenticator {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict: Mutex::new(verdict),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn verified() -> Self {
        Self::new(Verdict::Verified)
    }

    pub fn set(&self, verdict: Verdict) {
        *self.verdict.lock().unwrap() = verdict;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalAuthenticator for ScriptedLocalAuthenticator {
    async fn execute(&self) -> Result<bool, UserVerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let verdict = *self.verdict.lock().unwrap();
        match verdict {
            Verdict::Verified => Ok(true),
            Verdict::Rejected => Ok(false),
            Verdict::Unavailable => Err(UserVerificationError::Unavailable(
                "No biometrics enrolled".to_string(),
            )),
            Verdict::Cancelled => Err(UserVerificationError::Platform(Box::new(
                MockLocalAuthError::UserCancel,
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MockRpError {
    #[error("get registration data failed")]
    GetRegistrationDataFailed,
    #[error("verify registration failed")]
    VerifyRegistrationFailed,
    #[error("get authentication data failed")]
    GetAuthenticationDataFailed,
    #[error("verify authentication failed")]
    VerifyAuthenticationFailed,
}

/// Relying party step to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpFault {
    GetRegistrationData,
    VerifyRegistration,
    RejectRegistration,
    GetAuthenticationData,
    VerifyAuthentication,
}

#[derive(Debug, Clone)]
pub struct MockRegistrationOptions {
    pub username: String,
    pub display_name: String,
    pub user_id: Vec<u8>,
    pub attestation: AttestationConveyancePreference,
    pub attachment: AuthenticatorAttachment,
    pub user_verification: UserVerificationRequirement,
}

impl MockRegistrationOptions {
    pub fn new() -> Self {
        Self {
            username: "test-user".to_string(),
            display_name: "Test User".to_string(),
            user_id: USER_ID.to_vec(),
            attestation: AttestationConveyancePreference::None,
            attachment: AuthenticatorAttachment::Platform,
            user_verification: UserVerificationRequirement::Required,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<Vec<u8>>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

pub struct MockRegistrationData(PublicKeyCredentialCreationOptions);

impl From<MockRegistrationData> for PublicKeyCredentialCreationOptions {
    fn from(data: MockRegistrationData) -> Self {
        data.0
    }
}

#[derive(Debug, Clone)]
pub struct MockAuthenticationOptions {
    pub username: String,
    pub user_verification: UserVerificationRequirement,
    pub extensions: Option<ClientExtensionsInput>,
}

impl MockAuthenticationOptions {
    pub fn new() -> Self {
        Self {
            username: "test-user".to_string(),
            user_verification: UserVerificationRequirement::Required,
            extensions: None,
        }
    }

    pub fn with_extensions(mut self, extensions: ClientExtensionsInput) -> Self {
        self.extensions = Some(extensions);
        self
    }
}

pub struct MockAuthenticationData(PublicKeyCredentialRequestOptions);

impl From<MockAuthenticationData> for PublicKeyCredentialRequestOptions {
    fn from(data: MockAuthenticationData) -> Self {
        data.0
    }
}

/// Relying party double
///
/// Registering a credential puts it on both the exclude list and the allow
/// list of later ceremonies. Assertions are verified against the public key
/// captured at registration.
pub struct MockRelyingParty {
    fault: Mutex<Option<RpFault>>,
    pub_key_cred_params: Mutex<Vec<PublicKeyCredentialParameters>>,
    exclude_credentials: Mutex<Vec<PublicKeyCredentialDescriptor>>,
    allow_credentials: Mutex<Vec<PublicKeyCredentialDescriptor>>,
    public_keys: Mutex<HashMap<CredentialId, Vec<u8>>>,
    observed_counters: Mutex<Vec<u32>>,
    registrations: Mutex<Vec<PublicKeyCredentialCreateResult>>,
    assertions: Mutex<Vec<PublicKeyCredentialGetResult>>,
}

impl MockRelyingParty {
    pub fn new() -> Self {
        let params = CoseAlgorithm::ALL
            .iter()
            .map(|alg| PublicKeyCredentialParameters::new(alg.to_i32()))
            .collect();
        Self {
            fault: Mutex::new(None),
            pub_key_cred_params: Mutex::new(params),
            exclude_credentials: Mutex::new(Vec::new()),
            allow_credentials: Mutex::new(Vec::new()),
            public_keys: Mutex::new(HashMap::new()),
            observed_counters: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
            assertions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(fault: RpFault) -> Self {
        let rp = Self::new();
        rp.set_fault(Some(fault));
        rp
    }

    pub fn set_fault(&self, fault: Option<RpFault>) {
        *self.fault.lock().unwrap() = fault;
    }

    pub fn set_pub_key_cred_params(&self, params: Vec<PublicKeyCredentialParameters>) {
        *self.pub_key_cred_params.lock().unwrap() = params;
    }

    pub fn delete_exclude_and_allow_credentials(&self) {
        self.exclude_credentials.lock().unwrap().clear();
        self.allow_credentials.lock().unwrap().clear();
    }

    pub fn observed_counters(&self) -> Vec<u32> {
        self.observed_counters.lock().unwrap().clone()
    }

    pub fn registrations(&self) -> Vec<PublicKeyCredentialCreateResult> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn assertions(&self) -> Vec<PublicKeyCredentialGetResult> {
        self.assertions.lock().unwrap().clone()
    }

    fn fails_at(&self, fault: RpFault) -> bool {
        *self.fault.lock().unwrap() == Some(fault)
    }
}

#[async_trait]
impl RelyingParty for MockRelyingParty {
    type RegistrationOptions = MockRegistrationOptions;
    type RegistrationData = MockRegistrationData;
    type AuthenticationOptions = MockAuthenticationOptions;
    type AuthenticationData = MockAuthenticationData;
    type Error = MockRpError;

    async fn registration_data(
        &self,
        options: MockRegistrationOptions,
    ) -> Result<MockRegistrationData, MockRpError> {
        if self.fails_at(RpFault::GetRegistrationData) {
            return Err(MockRpError::GetRegistrationDataFailed);
        }

        let mut creation = PublicKeyCredentialCreationOptions::new(
            PublicKeyCredentialRpEntity::new(RP_ID, RP_NAME),
            PublicKeyCredentialUserEntity::new(options.user_id, options.username, options.display_name),
            CREATION_CHALLENGE,
        )
        .with_pub_key_cred_params(self.pub_key_cred_params.lock().unwrap().clone())
        .with_exclude_credentials(self.exclude_credentials.lock().unwrap().clone());
        creation.attestation = options.attestation;
        creation.authenticator_selection = Some(AuthenticatorSelectionCriteria {
            authenticator_attachment: Some(options.attachment),
            user_verification: options.user_verification,
            ..AuthenticatorSelectionCriteria::default()
        });

        Ok(MockRegistrationData(creation))
    }

    async fn verify_registration(&self, result: &PublicKeyCredentialCreateResult) -> Result<bool, MockRpError> {
        self.registrations.lock().unwrap().push(result.clone());
        if self.fails_at(RpFault::VerifyRegistration) {
            return Err(MockRpError::VerifyRegistrationFailed);
        }
        if self.fails_at(RpFault::RejectRegistration) {
            return Ok(false);
        }

        let public_key = result
            .authenticator_data()
            .ok()
            .and_then(|data| data.attested_credential_data)
            .and_then(|attested| Ec2CoseKey::from_cbor(&attested.public_key).ok())
            .map(|key| key.to_uncompressed().to_vec());
        let Some(public_key) = public_key else {
            return Ok(false);
        };

        let registered = PublicKeyCredentialDescriptor::new(result.id.clone());
        *self.exclude_credentials.lock().unwrap() = vec![registered.clone()];
        *self.allow_credentials.lock().unwrap() = vec![registered];
        self.public_keys.lock().unwrap().insert(result.id.clone(), public_key);
        Ok(true)
    }

    async fn authentication_data(
        &self,
        options: MockAuthenticationOptions,
    ) -> Result<MockAuthenticationData, MockRpError> {
        if self.fails_at(RpFault::GetAuthenticationData) {
            return Err(MockRpError::GetAuthenticationDataFailed);
        }

        let mut request = PublicKeyCredentialRequestOptions::new(RP_ID, ASSERTION_CHALLENGE)
            .with_allow_credentials(self.allow_credentials.lock().unwrap().clone());
        request.user_verification = options.user_verification;
        request.extensions = options.extensions;
        Ok(MockAuthenticationData(request))
    }

    async fn verify_authentication(&self, result: &PublicKeyCredentialGetResult) -> Result<bool, MockRpError> {
        self.assertions.lock().unwrap().push(result.clone());
        if self.fails_at(RpFault::VerifyAuthentication) {
            return Err(MockRpError::VerifyAuthenticationFailed);
        }

        let Ok(auth_data) = AuthenticatorData::parse(&result.authenticator_data) else {
            return Ok(false);
        };
        self.observed_counters.lock().unwrap().push(auth_data.sign_count);

        let public_key = self.public_keys.lock().unwrap().get(&result.id).cloned();
        let Some(public_key) = public_key else {
            return Ok(false);
        };
        Ok(webauthn_platform_crypto::ecdsa::verify(&public_key, &result.signed_data(), &result.signature).is_ok())
    }
}

pub type TestCredential =
    PublicKeyCredential<MockRelyingParty, MemoryKeyStore, MemorySourceStore, ScriptedLocalAuthenticator>;

/// Collaborators of one test, kept so the test can inspect them afterwards
pub struct Fixture {
    pub rp: Arc<MockRelyingParty>,
    pub keys: Arc<MemoryKeyStore>,
    pub sources: Arc<MemorySourceStore>,
    pub local_authenticator: Arc<ScriptedLocalAuthenticator>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(MockRelyingParty::new(), MemoryKeyStore::new(), MemorySourceStore::new())
    }

    pub fn with(rp: MockRelyingParty, keys: MemoryKeyStore, sources: MemorySourceStore) -> Self {
        Self {
            rp: Arc::new(rp),
            keys: Arc::new(keys),
            sources: Arc::new(sources),
            local_authenticator: Arc::new(ScriptedLocalAuthenticator::verified()),
        }
    }

    /// Biometric credential surface with an origin
    pub fn credential(&self) -> TestCredential {
        PublicKeyCredential::biometric(
            Arc::clone(&self.rp),
            Arc::clone(&self.keys),
            Arc::clone(&self.sources),
            Arc::clone(&self.local_authenticator),
        )
        .with_origin(ORIGIN)
    }
}
