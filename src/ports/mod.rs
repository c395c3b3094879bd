//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! - `SessionStorage` - One tier (durable or ephemeral) of flat session persistence
//! - `RequestExecutor` - Performs one API call and reports transport failures
//! - `PaymentGateway` - Third-party checkout UI with a single callback
//! - `SessionObserver` - Synchronous session change notifications

mod payment_gateway;
mod request_executor;
mod session_observer;
mod session_storage;

pub use payment_gateway::{GatewayError, GatewayOutcome, PayRequest, PaymentGateway};
pub use request_executor::{ApiRequest, HttpMethod, RequestExecutor, TransportError};
pub use session_observer::SessionObserver;
pub use session_storage::{SessionStorage, StorageError};
