//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the core to external systems:
//! - `storage` - Durable (file) and ephemeral (in-memory) session storage
//! - `http` - Request executors (reqwest, mock)
//! - `gateway` - Payment gateway bridges (channel, mock)

pub mod gateway;
pub mod http;
pub mod storage;

pub use gateway::{ChannelPaymentGateway, MockPaymentGateway, PaymentPrompt};
pub use http::{HttpClientError, MockRequestExecutor, ReqwestExecutor};
pub use storage::{FileSessionStorage, InMemorySessionStorage};
