//! Application handlers.
//!
//! Command handlers that orchestrate the facade, the gateway, and the
//! session store.

pub mod account;
pub mod checkout;

pub use account::{
    AccountError, CheckEmailAvailabilityHandler, CompleteOAuthSignInHandler, OAuthProvider,
    SignInCommand, SignInHandler, SignInResult, SignUpCommand, SignUpHandler,
};
pub use checkout::{
    CheckoutError, CheckoutSettings, StartCheckoutCommand, StartCheckoutHandler,
    StartCheckoutResult,
};
