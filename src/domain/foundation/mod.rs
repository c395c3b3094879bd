//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the LottoMate session and payment core.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{ErrorKind, ServiceError, ValidationError};
pub use ids::{GatewayTransactionId, MerchantOrderId, PlanId, SubjectId, SubscriptionId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
