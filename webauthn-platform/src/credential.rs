//! Public key credential ceremonies
//!
//! [`PublicKeyCredential`] drives registration (`create`) and authentication
//! (`get`) end to end: it asks the relying party for options, builds client
//! data, runs the platform authenticator and hands the result back to the
//! relying party for verification.
//!
//! A registration whose verification fails after the authenticator stored a
//! credential is rolled back: the private key and the credential source are
//! deleted again. A relying party that answers "not accepted" without failing
//! gets that verdict back and the credential stays. An assertion is never
//! rolled back; a counter bump followed by a rejected assertion is kept.
//!
//! Every ceremony goes through a [`CeremonyQueue`]. Surfaces use the
//! process-wide [`CeremonyQueue::shared`] queue unless given another, so
//! ceremonies never overlap even across independently built surfaces.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use webauthn_platform_ctap::authenticator::{Authenticator, AuthenticatorConfig};
use webauthn_platform_ctap::authenticator_type::AuthenticatorType;
use webauthn_platform_ctap::callbacks::{CredentialSourceStore, KeyStore, LocalAuthenticator};
use webauthn_platform_ctap::commands::{GetAssertionRequest, MakeCredentialRequest};
use webauthn_platform_ctap::error::{CoreErrorKind, Result, WebAuthnError};
use webauthn_platform_ctap::extensions::ClientExtensionsInput;
use webauthn_platform_ctap::rollback;

use crate::client_data::{ClientDataType, CollectedClientData};
use crate::options::{PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions};
use crate::queue::{CeremonyQueue, CeremonyState, Ticket};
use crate::relying_party::RelyingParty;
use crate::response::{PublicKeyCredentialCreateResult, PublicKeyCredentialGetResult};

const MIN_USER_ID_LENGTH: usize = 1;
const MAX_USER_ID_LENGTH: usize = 64;

/// Credential management surface for one relying party
///
/// Cheap to clone; clones share the collaborators and the queue.
pub struct PublicKeyCredential<R, K, S, L> {
    aaguid: Uuid,
    origin: Option<String>,
    relying_party: Arc<R>,
    keys: Arc<K>,
    sources: Arc<S>,
    local_authenticator: Arc<L>,
    queue: CeremonyQueue,
}

impl<R, K, S, L> Clone for PublicKeyCredential<R, K, S, L> {
    fn clone(&self) -> Self {
        Self {
            aaguid: self.aaguid,
            origin: self.origin.clone(),
            relying_party: Arc::clone(&self.relying_party),
            keys: Arc::clone(&self.keys),
            sources: Arc::clone(&self.sources),
            local_authenticator: Arc::clone(&self.local_authenticator),
            queue: self.queue.clone(),
        }
    }
}

impl<R, K, S, L> PublicKeyCredential<R, K, S, L>
where
    R: RelyingParty,
    K: KeyStore + 'static,
    S: CredentialSourceStore + 'static,
    L: LocalAuthenticator + 'static,
{
    /// Create a credential surface on the process-wide ceremony queue
    ///
    /// The AAGUID starts out nil, which no authenticator type accepts; use
    /// [`Self::with_aaguid`] or one of the typed constructors.
    pub fn new(relying_party: Arc<R>, keys: Arc<K>, sources: Arc<S>, local_authenticator: Arc<L>) -> Self {
        Self {
            aaguid: Uuid::nil(),
            origin: None,
            relying_party,
            keys,
            sources,
            local_authenticator,
            queue: CeremonyQueue::shared(),
        }
    }

    /// Surface backed by the biometric authenticator
    pub fn biometric(relying_party: Arc<R>, keys: Arc<K>, sources: Arc<S>, local_authenticator: Arc<L>) -> Self {
        Self::new(relying_party, keys, sources, local_authenticator)
            .with_aaguid(AuthenticatorType::Biometric.aaguid())
    }

    /// Surface backed by the device-credential (passcode) authenticator
    pub fn device_credential(
        relying_party: Arc<R>,
        keys: Arc<K>,
        sources: Arc<S>,
        local_authenticator: Arc<L>,
    ) -> Self {
        Self::new(relying_party, keys, sources, local_authenticator)
            .with_aaguid(AuthenticatorType::DeviceCredential.aaguid())
    }

    pub fn with_aaguid(mut self, aaguid: Uuid) -> Self {
        self.aaguid = aaguid;
        self
    }

    /// Origin written into client data, e.g. `ios:bundle-id:com.example.app`
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Run ceremonies on `queue` instead of the process-wide one
    pub fn with_queue(mut self, queue: CeremonyQueue) -> Self {
        self.queue = queue;
        self
    }

    pub fn aaguid(&self) -> Uuid {
        self.aaguid
    }

    pub fn queue(&self) -> &CeremonyQueue {
        &self.queue
    }

    /// Register a new credential
    ///
    /// # Returns
    ///
    /// The relying party's verdict. Only a verification error rolls the
    /// credential back; `Ok(false)` leaves it in both stores.
    pub async fn create(&self, options: R::RegistrationOptions) -> Result<bool> {
        finish(self.submit_create(options)).await
    }

    /// Authenticate with a registered credential
    ///
    /// # Returns
    ///
    /// The relying party's verdict
    pub async fn get(&self, options: R::AuthenticationOptions) -> Result<bool> {
        finish(self.submit_get(options)).await
    }

    /// Queue a registration and return its ticket
    pub fn submit_create(&self, options: R::RegistrationOptions) -> Ticket<Result<bool>> {
        let this = self.clone();
        self.queue.submit(async move { this.run_create(options).await })
    }

    /// Queue an authentication and return its ticket
    pub fn submit_get(&self, options: R::AuthenticationOptions) -> Ticket<Result<bool>> {
        let this = self.clone();
        self.queue.submit(async move { this.run_get(options).await })
    }

    async fn run_create(&self, options: R::RegistrationOptions) -> Result<bool> {
        let data = self
            .relying_party
            .registration_data(options)
            .await
            .map_err(WebAuthnError::relying_party)?;
        let options: PublicKeyCredentialCreationOptions = data.into();
        let rp_id = options.rp.id.as_str();
        debug!(rp_id, "registration started");

        let user_id_len = options.user.id.len();
        if !(MIN_USER_ID_LENGTH..=MAX_USER_ID_LENGTH).contains(&user_id_len) {
            return Err(WebAuthnError::core(
                CoreErrorKind::TypeError,
                format!("User ID length is invalid: {user_id_len}"),
            ));
        }

        let params = options.acceptable_algorithms();
        if params.is_empty() {
            return Err(WebAuthnError::core(
                CoreErrorKind::NotSupportedError,
                "No acceptable public-key credential parameters",
            ));
        }

        let origin = self.origin()?;
        let client_data_json =
            CollectedClientData::new(ClientDataType::Create, &options.challenge, origin).to_json()?;
        let authenticator = self.authenticator()?;

        let request = MakeCredentialRequest::new(
            CollectedClientData::hash(&client_data_json),
            options.rp.clone(),
            options.user.clone(),
            params,
        )
        .with_exclude_list(options.exclude_credentials.clone())
        .with_extensions(
            options
                .extensions
                .as_ref()
                .map(ClientExtensionsInput::process_authenticator_extensions_input),
        );
        let response = authenticator.make_credential(request).await?;

        // From here on the credential exists in both stores
        let credential_id = response.credential_id.clone();
        let result = PublicKeyCredentialCreateResult {
            id: response.credential_id,
            client_data_json,
            attestation_object: response.attestation_object,
            client_extension_results: options
                .extensions
                .as_ref()
                .and_then(ClientExtensionsInput::process_client_extensions_output),
        };

        match self.relying_party.verify_registration(&result).await {
            Ok(verified) => {
                info!(rp_id, credential_id = %credential_id, verified, "registration finished");
                Ok(verified)
            }
            Err(e) => {
                let trigger = WebAuthnError::relying_party(e);
                warn!(rp_id, credential_id = %credential_id, error = %trigger, "registration verification failed, rolling back");
                Err(rollback::compensate(
                    self.keys.as_ref(),
                    self.sources.as_ref(),
                    &credential_id,
                    trigger,
                ))
            }
        }
    }

    async fn run_get(&self, options: R::AuthenticationOptions) -> Result<bool> {
        let data = self
            .relying_party
            .authentication_data(options)
            .await
            .map_err(WebAuthnError::relying_party)?;
        let options: PublicKeyCredentialRequestOptions = data.into();
        let rp_id = options.rp_id.as_str();
        debug!(rp_id, allow_list = options.allow_credentials.len(), "authentication started");

        let origin = self.origin()?;
        let client_data_json =
            CollectedClientData::new(ClientDataType::Get, &options.challenge, origin).to_json()?;
        let authenticator = self.authenticator()?;

        let request = GetAssertionRequest::new(rp_id, CollectedClientData::hash(&client_data_json))
            .with_allow_list(options.allow_credentials.clone())
            .with_extensions(
                options
                    .extensions
                    .as_ref()
                    .map(ClientExtensionsInput::process_authenticator_extensions_input),
            );
        let response = authenticator.get_assertion(request).await?;

        let result = PublicKeyCredentialGetResult {
            id: response.credential_id,
            client_data_json,
            authenticator_data: response.authenticator_data,
            signature: response.signature,
            user_handle: response.user_handle,
            client_extension_results: options
                .extensions
                .as_ref()
                .and_then(ClientExtensionsInput::process_client_extensions_output),
        };

        let verified = self
            .relying_party
            .verify_authentication(&result)
            .await
            .map_err(WebAuthnError::relying_party)?;
        info!(rp_id, credential_id = %result.id, verified, "authentication finished");
        Ok(verified)
    }

    fn origin(&self) -> Result<&str> {
        self.origin.as_deref().ok_or_else(|| WebAuthnError::Utility {
            cause: "Failed to get an origin".to_string(),
        })
    }

    fn authenticator(&self) -> Result<Authenticator<K, S, L>> {
        let authenticator_type = AuthenticatorType::from_aaguid(&self.aaguid).ok_or_else(|| {
            WebAuthnError::core(
                CoreErrorKind::NotSupportedError,
                format!("Given aaguid is not supported: {}", self.aaguid),
            )
        })?;

        Ok(Authenticator::new(
            AuthenticatorConfig::new(authenticator_type),
            Arc::clone(&self.keys),
            Arc::clone(&self.sources),
            Arc::clone(&self.local_authenticator),
        ))
    }
}

async fn finish(ticket: Ticket<Result<bool>>) -> Result<bool> {
    match ticket.outcome().await {
        Ok(result) => result,
        Err(CeremonyState::Cancelled) => Err(WebAuthnError::core(
            CoreErrorKind::NotAllowedError,
            "Ceremony was cancelled before it started",
        )),
        Err(state) => Err(WebAuthnError::Unknown(
            format!("Ceremony ended without a result ({state:?})").into(),
        )),
    }
}
