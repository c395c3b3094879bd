//! Session module - the authenticated identity for the current client.
//!
//! - `model` - `Session`, persistence tiers, storage keys, change events
//! - `credentials` - unverified JWT inspection for expiry decisions

mod credentials;
mod model;

pub use credentials::{decode_claims, is_expired_at, CredentialClaims};
pub use model::{keys, PersistencePreference, Session, SessionEvent};
