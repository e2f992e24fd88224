//! Compensating deletes
//!
//! The key store and the credential source store are independent resources
//! with no shared transaction. When a registration fails after both records
//! were written, they are deleted again: key first, then source, each delete
//! retried a bounded number of times.

use tracing::{debug, warn};

use crate::callbacks::{CredentialSourceStore, KeyStore};
use crate::error::WebAuthnError;
use crate::types::CredentialId;

/// Attempts per storage delete during compensation
pub const MAX_DELETE_ATTEMPTS: usize = 2;

/// Run `op` up to `attempts` times, returning the first success or the last error
pub fn retry<T, E, F>(attempts: usize, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                debug!(attempt, error = %err, "retrying after failure");
                attempt += 1;
            }
        }
    }
}

/// Delete only the private key; used when the source was never written
///
/// Returns `trigger` if the key is gone afterwards, otherwise the delete
/// failure annotated with `trigger`.
pub fn discard_key<K: KeyStore + ?Sized>(
    keys: &K,
    id: &CredentialId,
    trigger: WebAuthnError,
) -> WebAuthnError {
    match retry(MAX_DELETE_ATTEMPTS, || keys.delete(id)) {
        Ok(()) => trigger,
        Err(err) => {
            warn!(credential_id = %id, error = %err, "failed to discard private key");
            WebAuthnError::key_storage(err, id).triggered_by(trigger)
        }
    }
}

/// Delete the key and the credential source for `id`
///
/// Returns `trigger` when both deletes succeed. If a delete still fails after
/// [`MAX_DELETE_ATTEMPTS`], returns that storage error with `trigger` attached
/// as its delete trigger. The source is not touched if the key delete failed.
pub fn compensate<K, S>(keys: &K, sources: &S, id: &CredentialId, trigger: WebAuthnError) -> WebAuthnError
where
    K: KeyStore + ?Sized,
    S: CredentialSourceStore + ?Sized,
{
    debug!(credential_id = %id, trigger = %trigger, "deleting credential after failure");

    if let Err(err) = retry(MAX_DELETE_ATTEMPTS, || keys.delete(id)) {
        warn!(credential_id = %id, error = %err, "compensating key delete failed");
        return WebAuthnError::key_storage(err, id).triggered_by(trigger);
    }

    if let Err(err) = retry(MAX_DELETE_ATTEMPTS, || sources.delete(id)) {
        warn!(credential_id = %id, error = %err, "compensating source delete failed");
        return WebAuthnError::source_storage(err, Some(id)).triggered_by(trigger);
    }

    trigger
}
