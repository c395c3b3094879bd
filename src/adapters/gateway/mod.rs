//! Payment Gateway Adapters
//!
//! Implementations of the PaymentGateway port.
//!
//! ## Available Adapters
//!
//! - **ChannelPaymentGateway** - Hands each payment to a UI host over a channel
//!   and waits for its single-use callback
//! - **MockPaymentGateway** - Scripted outcomes and call tracking (testing)
//!
//! ## Usage
//!
//! ```ignore
//! let (gateway, mut prompts) = ChannelPaymentGateway::new(4);
//!
//! tokio::spawn(async move {
//!     while let Some(prompt) = prompts.recv().await {
//!         let outcome = show_payment_ui(prompt.request()).await;
//!         prompt.respond(outcome);
//!     }
//! });
//! ```

mod channel_gateway;
mod mock_gateway;

pub use channel_gateway::{ChannelPaymentGateway, PaymentPrompt};
pub use mock_gateway::MockPaymentGateway;
