//! authenticatorGetAssertion
//!
//! Signs a relying party challenge with a previously registered credential.
//!
//! Spec: <https://www.w3.org/TR/webauthn-2/#sctn-op-get-assertion>

use tracing::{debug, info};

use crate::{
    authenticator::Authenticator,
    authenticator_data::AuthenticatorData,
    callbacks::{CredentialSourceStore, KeyStore, LocalAuthenticator},
    error::{CoreErrorKind, Result, WebAuthnError},
    extensions::AuthenticatorExtensionsInput,
    types::{CredentialId, PublicKeyCredentialDescriptor, PublicKeyCredentialSource},
};

/// getAssertion input
#[derive(Debug, Clone)]
pub struct GetAssertionRequest {
    pub rp_id: String,
    /// SHA-256 of the client data JSON
    pub client_data_hash: [u8; 32],
    /// Credentials the relying party accepts; empty means any discoverable one
    pub allow_list: Vec<PublicKeyCredentialDescriptor>,
    pub extensions: Option<AuthenticatorExtensionsInput>,
}

impl GetAssertionRequest {
    pub fn new(rp_id: impl Into<String>, client_data_hash: [u8; 32]) -> Self {
        Self {
            rp_id: rp_id.into(),
            client_data_hash,
            allow_list: Vec::new(),
            extensions: None,
        }
    }

    pub fn with_allow_list(mut self, allow_list: Vec<PublicKeyCredentialDescriptor>) -> Self {
        self.allow_list = allow_list;
        self
    }

    pub fn with_extensions(mut self, extensions: Option<AuthenticatorExtensionsInput>) -> Self {
        self.extensions = extensions;
        self
    }
}

/// getAssertion output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAssertionResponse {
    pub credential_id: CredentialId,
    pub authenticator_data: Vec<u8>,
    /// Signature over `authenticator_data || client_data_hash`
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// Handle authenticatorGetAssertion
pub async fn handle<K, S, L>(auth: &Authenticator<K, S, L>, request: GetAssertionRequest) -> Result<GetAssertionResponse>
where
    K: KeyStore,
    S: CredentialSourceStore,
    L: LocalAuthenticator,
{
    let rp_id = request.rp_id.as_str();
    debug!(rp_id, allow_list = request.allow_list.len(), "getAssertion");

    // Step 1: Collect candidate credentials for this relying party
    let candidates = find_candidates(auth.credential_source_store(), rp_id, &request.allow_list)?;

    // Step 2: Nothing usable
    let Some(source) = candidates.into_iter().next() else {
        return Err(WebAuthnError::core(
            CoreErrorKind::NotAllowedError,
            format!("No credential is registered for {rp_id}"),
        ));
    };
    let credential_id = source.id;

    // Step 3: Local user verification
    auth.verify_user().await?;

    if let Some(extensions) = &request.extensions
        && !extensions.is_empty()
    {
        debug!(rp_id, "no assertion extensions produce output, ignoring input");
    }

    // Step 4: Load the private key
    let private_key = auth
        .key_store()
        .load(&credential_id)
        .map_err(|e| WebAuthnError::key_storage(e, &credential_id))?
        .ok_or(WebAuthnError::KeyNotFound)?;

    // Step 5: Bump the counter before anything is signed
    let sign_count = auth
        .credential_source_store()
        .increase_signature_counter(&credential_id)
        .map_err(|e| WebAuthnError::source_storage(e, Some(&credential_id)))?;

    // Step 6: Authenticator data (no attested credential data) and signature
    let authenticator_data = AuthenticatorData::new(rp_id, sign_count).to_bytes()?;
    let mut signed = Vec::with_capacity(authenticator_data.len() + request.client_data_hash.len());
    signed.extend_from_slice(&authenticator_data);
    signed.extend_from_slice(&request.client_data_hash);
    let signature = private_key.sign(&signed)?;

    info!(rp_id, credential_id = %credential_id, sign_count, "assertion created");

    // Step 7
    Ok(GetAssertionResponse {
        credential_id,
        authenticator_data,
        signature,
        user_handle: source.user_id,
    })
}

/// Resolve the sources usable for `rp_id`
///
/// With an allow list each entry is loaded individually and unknown ids are
/// skipped; without one every stored source is considered.
fn find_candidates<S: CredentialSourceStore>(
    sources: &S,
    rp_id: &str,
    allow_list: &[PublicKeyCredentialDescriptor],
) -> Result<Vec<PublicKeyCredentialSource>> {
    if allow_list.is_empty() {
        let all = sources
            .load_all()
            .map_err(|e| WebAuthnError::source_storage(e, None))?;
        return Ok(all.into_iter().filter(|s| s.rp_id == rp_id).collect());
    }

    let mut candidates = Vec::new();
    for descriptor in allow_list {
        let source = sources
            .load(&descriptor.id)
            .map_err(|e| WebAuthnError::source_storage(e, Some(&descriptor.id)))?;
        match source {
            Some(source) if source.rp_id == rp_id => candidates.push(source),
            Some(_) => debug!(credential_id = %descriptor.id, "allowed credential belongs to another rp"),
            None => debug!(credential_id = %descriptor.id, "allowed credential not found"),
        }
    }
    Ok(candidates)
}
