//! Application layer - session lifecycle, the service facade, and handlers.
//!
//! The facade is the single entry point for backend calls. Handlers compose
//! it with the payment gateway and the session store.

pub mod credential_manager;
pub mod handlers;
pub mod operations;
pub mod service_facade;
pub mod session_store;
pub mod subscription_api;

pub use credential_manager::{CredentialManager, RefreshPolicy, TokenPair};
pub use handlers::{
    AccountError, CheckEmailAvailabilityHandler, CheckoutError, CheckoutSettings,
    CompleteOAuthSignInHandler, OAuthProvider, SignInCommand, SignInHandler, SignInResult,
    SignUpCommand, SignUpHandler, StartCheckoutCommand, StartCheckoutHandler,
    StartCheckoutResult,
};
pub use service_facade::{FacadeState, RequestContext, ServiceFacade};
pub use session_store::{ObserverId, SessionError, SessionStore};
pub use subscription_api::SubscriptionApi;
