//! WebAuthn authenticator operations

pub mod get_assertion;
pub mod make_credential;

pub use get_assertion::{GetAssertionRequest, GetAssertionResponse};
pub use make_credential::{MakeCredentialRequest, MakeCredentialResponse};
