//! authenticatorMakeCredential
//!
//! Creates a new credential for a relying party.
//!
//! Spec: <https://www.w3.org/TR/webauthn-2/#sctn-op-make-cred>

use tracing::{debug, info};

use crate::{
    attestation::NoneAttestationObject,
    authenticator::{Authenticator, AuthenticatorConfig},
    authenticator_data::{AttestedCredentialData, AuthenticatorData},
    callbacks::{CredentialSourceStore, KeyStore, LocalAuthenticator},
    cose::{CoseAlgorithm, Ec2CoseKey},
    error::{CoreErrorKind, Result, WebAuthnError},
    extensions::AuthenticatorExtensionsInput,
    key::PrivateKey,
    rollback,
    types::{
        CredentialId, PUBLIC_KEY_TYPE, PublicKeyCredentialDescriptor, PublicKeyCredentialParameters,
        PublicKeyCredentialRpEntity, PublicKeyCredentialSource, PublicKeyCredentialUserEntity,
    },
};

/// makeCredential input
#[derive(Debug, Clone)]
pub struct MakeCredentialRequest {
    /// SHA-256 of the client data JSON
    pub client_data_hash: [u8; 32],
    pub rp: PublicKeyCredentialRpEntity,
    pub user: PublicKeyCredentialUserEntity,
    /// Acceptable (type, algorithm) pairs in relying party preference order
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    pub exclude_list: Vec<PublicKeyCredentialDescriptor>,
    pub extensions: Option<AuthenticatorExtensionsInput>,
}

impl MakeCredentialRequest {
    pub fn new(
        client_data_hash: [u8; 32],
        rp: PublicKeyCredentialRpEntity,
        user: PublicKeyCredentialUserEntity,
        pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    ) -> Self {
        Self {
            client_data_hash,
            rp,
            user,
            pub_key_cred_params,
            exclude_list: Vec::new(),
            extensions: None,
        }
    }

    pub fn with_exclude_list(mut self, exclude_list: Vec<PublicKeyCredentialDescriptor>) -> Self {
        self.exclude_list = exclude_list;
        self
    }

    pub fn with_extensions(mut self, extensions: Option<AuthenticatorExtensionsInput>) -> Self {
        self.extensions = extensions;
        self
    }
}

/// makeCredential output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeCredentialResponse {
    pub credential_id: CredentialId,
    /// CBOR "none" attestation object
    pub attestation_object: Vec<u8>,
    pub user_handle: Vec<u8>,
}

/// Handle authenticatorMakeCredential
///
/// Once the key has been stored, any later failure inside this function
/// removes what was written before returning. After a successful return the
/// credential exists in both stores.
pub async fn handle<K, S, L>(
    auth: &Authenticator<K, S, L>,
    request: MakeCredentialRequest,
) -> Result<MakeCredentialResponse>
where
    K: KeyStore,
    S: CredentialSourceStore,
    L: LocalAuthenticator,
{
    let rp_id = request.rp.id.as_str();
    debug!(rp_id, "makeCredential");

    // Step 1: Local user verification
    auth.verify_user().await?;

    // Step 2: Reject if the account already has a credential in the exclude list
    check_exclude_list(auth.credential_source_store(), &request)?;

    // Step 3: Pick the first requested algorithm we can issue
    let algorithm = select_algorithm(auth.config(), &request.pub_key_cred_params).ok_or_else(|| {
        WebAuthnError::core(
            CoreErrorKind::NotSupportedError,
            "None of the requested algorithms is supported",
        )
    })?;
    debug!(rp_id, %algorithm, "selected algorithm");

    // Step 4: Generate key pair and credential id
    let (private_key, public_key) = PrivateKey::generate(algorithm)?;
    let credential_id = CredentialId::generate(auth.config().credential_id_length);

    // Step 5: Persist the private key
    auth.key_store()
        .store(&credential_id, &private_key)
        .map_err(|e| WebAuthnError::key_storage(e, &credential_id))?;

    // Step 6: Persist the credential source
    let source = PublicKeyCredentialSource::new(
        credential_id.clone(),
        auth.config().aaguid(),
        rp_id,
        Some(request.user.id.clone()),
    );
    if let Err(e) = auth.credential_source_store().store(&source) {
        let err = WebAuthnError::source_storage(e, Some(&credential_id));
        return Err(rollback::discard_key(auth.key_store(), &credential_id, err));
    }

    // Step 7: Build the attestation object
    let attestation_object = match build_attestation_object(auth.config(), &request, &credential_id, &public_key) {
        Ok(object) => object,
        Err(err) => {
            return Err(rollback::compensate(
                auth.key_store(),
                auth.credential_source_store(),
                &credential_id,
                err,
            ));
        }
    };

    info!(rp_id, credential_id = %credential_id, "credential created");

    Ok(MakeCredentialResponse {
        credential_id,
        attestation_object,
        user_handle: request.user.id,
    })
}

fn check_exclude_list<S: CredentialSourceStore>(sources: &S, request: &MakeCredentialRequest) -> Result<()> {
    for descriptor in &request.exclude_list {
        if descriptor.cred_type != PUBLIC_KEY_TYPE {
            continue;
        }

        let source = sources
            .load(&descriptor.id)
            .map_err(|e| WebAuthnError::source_storage(e, Some(&descriptor.id)))?;

        if let Some(source) = source
            && source.is_bound_to(&request.rp.id, &request.user.id)
        {
            info!(rp_id = %request.rp.id, credential_id = %descriptor.id, "account already registered");
            return Err(WebAuthnError::core(
                CoreErrorKind::InvalidStateError,
                format!("Credential {} is already registered for this user", descriptor.id),
            ));
        }
    }
    Ok(())
}

fn select_algorithm(config: &AuthenticatorConfig, params: &[PublicKeyCredentialParameters]) -> Option<CoseAlgorithm> {
    params
        .iter()
        .filter(|param| param.cred_type == PUBLIC_KEY_TYPE)
        .filter_map(|param| CoseAlgorithm::from_i32(param.alg))
        .find(|alg| config.supports(*alg))
}

fn build_attestation_object(
    config: &AuthenticatorConfig,
    request: &MakeCredentialRequest,
    credential_id: &CredentialId,
    public_key: &[u8],
) -> Result<Vec<u8>> {
    let cose_key = Ec2CoseKey::from_uncompressed(public_key).to_cbor()?;
    let extensions = request
        .extensions
        .as_ref()
        .and_then(AuthenticatorExtensionsInput::process_make_credential);

    let auth_data = AuthenticatorData::new(&request.rp.id, 0)
        .with_attested_credential_data(AttestedCredentialData::new(
            config.aaguid(),
            credential_id.clone(),
            cose_key,
        ))
        .with_extensions(extensions)
        .to_bytes()?;

    NoneAttestationObject::new(auth_data).to_cbor()
}
