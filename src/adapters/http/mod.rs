//! HTTP Adapters
//!
//! Implementations of the RequestExecutor port.
//!
//! ## Available Adapters
//!
//! - **ReqwestExecutor** - JSON over HTTP against the LottoMate API
//! - **MockRequestExecutor** - Scripted replies and call tracking (testing)

mod activity;
mod mock_executor;
mod reqwest_executor;

pub use activity::{InFlightGuard, RequestActivity};
pub use mock_executor::MockRequestExecutor;
pub use reqwest_executor::{HttpClientError, ReqwestExecutor};
