//! Error types for the domain layer.
//!
//! `ValidationError` covers value-object construction. `ServiceError` is the
//! normalized failure every privileged operation surfaces to callers; its
//! `ErrorKind` is the small taxonomy UI code switches on.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure categories surfaced at the service boundary.
///
/// Callers pick their recovery path from the kind alone: retry, redirect to
/// sign-in, or show a support contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A privileged operation was attempted without a live session.
    AuthRequired,
    /// The server rejected the credential; the session has been cleared.
    SessionExpired,
    /// No response, a timeout, an undecodable body, or a server fault.
    TransportFailure,
    /// A server-authored rejection unrelated to authentication.
    BusinessRejection,
    /// The gateway charged the buyer but the server never confirmed it.
    PaidUnverified,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::AuthRequired => "AUTH_REQUIRED",
            ErrorKind::SessionExpired => "SESSION_EXPIRED",
            ErrorKind::TransportFailure => "TRANSPORT_FAILURE",
            ErrorKind::BusinessRejection => "BUSINESS_REJECTION",
            ErrorKind::PaidUnverified => "PAID_UNVERIFIED",
        };
        write!(f, "{}", s)
    }
}

/// Normalized service error with kind, message, and optional details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn auth_required() -> Self {
        Self::new(ErrorKind::AuthRequired, "Sign-in required")
    }

    pub fn session_expired() -> Self {
        Self::new(ErrorKind::SessionExpired, "Session expired, please sign in again")
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportFailure, message)
    }

    /// Creates a business rejection carrying the server's message verbatim.
    pub fn business_rejection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BusinessRejection, message)
    }

    /// Creates a paid-but-unverified error for manual reconciliation.
    pub fn paid_unverified(
        gateway_transaction_id: impl Into<String>,
        merchant_order_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::PaidUnverified,
            format!(
                "Payment was approved but could not be verified: {}",
                reason.into()
            ),
        )
        .with_detail("gateway_transaction_id", gateway_transaction_id)
        .with_detail("merchant_order_id", merchant_order_id)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns a detail value if present.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    /// Whether retrying with backoff is safe.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::TransportFailure
    }

    /// Whether the caller should send the user back to sign-in.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::AuthRequired | ErrorKind::SessionExpired
        )
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("subject_id");
        assert_eq!(format!("{}", err), "Field 'subject_id' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("duration_months", 1, 120, 0);
        assert_eq!(
            format!("{}", err),
            "Field 'duration_months' must be between 1 and 120, got 0"
        );
    }

    #[test]
    fn error_kind_displays_screaming_snake_case() {
        assert_eq!(format!("{}", ErrorKind::AuthRequired), "AUTH_REQUIRED");
        assert_eq!(format!("{}", ErrorKind::PaidUnverified), "PAID_UNVERIFIED");
        assert_eq!(
            format!("{}", ErrorKind::BusinessRejection),
            "BUSINESS_REJECTION"
        );
    }

    #[test]
    fn service_error_displays_kind_and_message() {
        let err = ServiceError::business_rejection("plan not found");
        assert_eq!(format!("{}", err), "[BUSINESS_REJECTION] plan not found");
    }

    #[test]
    fn business_rejection_keeps_message_verbatim() {
        let err = ServiceError::business_rejection("email already registered");
        assert_eq!(err.message, "email already registered");
    }

    #[test]
    fn paid_unverified_carries_reconciliation_details() {
        let err = ServiceError::paid_unverified("imp_123", "subscription_1_abc", "timeout");
        assert_eq!(err.kind, ErrorKind::PaidUnverified);
        assert_eq!(err.detail("gateway_transaction_id"), Some("imp_123"));
        assert_eq!(err.detail("merchant_order_id"), Some("subscription_1_abc"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(ServiceError::transport_failure("timeout").is_retryable());
        assert!(!ServiceError::auth_required().is_retryable());
        assert!(!ServiceError::session_expired().is_retryable());
        assert!(!ServiceError::business_rejection("nope").is_retryable());
    }

    #[test]
    fn auth_kinds_require_reauthentication() {
        assert!(ServiceError::auth_required().requires_reauthentication());
        assert!(ServiceError::session_expired().requires_reauthentication());
        assert!(!ServiceError::transport_failure("x").requires_reauthentication());
    }
}
