//! LottoMate Core - session and transaction orchestration
//!
//! This crate keeps a user signed in across restarts and credential expiry,
//! gates every backend call behind one authentication and error policy, and
//! turns a payment gateway approval into a server-verified subscription.

pub mod adapters;
pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;

pub use client::{BootstrapError, LottoMate};
