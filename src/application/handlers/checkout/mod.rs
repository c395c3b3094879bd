//! Checkout handlers.

mod start_checkout;

pub use start_checkout::{
    CheckoutError, CheckoutSettings, StartCheckoutCommand, StartCheckoutHandler,
    StartCheckoutResult,
};
