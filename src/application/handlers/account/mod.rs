//! Account handlers: password sign-in, registration, and OAuth2 callbacks.

mod oauth_callback;
mod sign_in;
mod sign_up;

pub use oauth_callback::{CompleteOAuthSignInHandler, OAuthProvider};
pub use sign_in::{SignInCommand, SignInHandler, SignInResult};
pub use sign_up::{CheckEmailAvailabilityHandler, SignUpCommand, SignUpHandler};

use crate::application::session_store::SessionError;
use crate::domain::foundation::{ServiceError, ValidationError};

/// Errors from account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Unexpected sign-in response: {0}")]
    MalformedResponse(String),

    #[error("Invalid sign-in callback: {0}")]
    InvalidCallback(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
