//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `session` - Authenticated session, persistence tiers, credential inspection
//! - `subscription` - Plans, billing periods, checkout attempts, subscription records

pub mod foundation;
pub mod session;
pub mod subscription;
