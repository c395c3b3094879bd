//! Registration and email availability.

use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};
use std::sync::Arc;

use super::AccountError;
use crate::application::credential_manager::payload;
use crate::application::operations;
use crate::application::service_facade::ServiceFacade;
use crate::domain::foundation::{SubjectId, ValidationError};
use crate::ports::ApiRequest;

const SIGNUP_PATH: &str = "auth/signup";
const CHECK_EMAIL_PATH: &str = "user/check-email";

/// Command to register a new account.
#[derive(Debug, Clone)]
pub struct SignUpCommand {
    pub email: String,
    pub name: String,
    pub password: Secret<String>,
}

/// Handler for registration. Creates no session.
pub struct SignUpHandler {
    facade: Arc<ServiceFacade>,
}

impl SignUpHandler {
    pub fn new(facade: Arc<ServiceFacade>) -> Self {
        Self { facade }
    }

    /// Registers the account and returns the server's confirmation message.
    pub async fn handle(&self, cmd: SignUpCommand) -> Result<Option<String>, AccountError> {
        let email = SubjectId::new(cmd.email)?;
        if cmd.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        if cmd.password.expose_secret().is_empty() {
            return Err(ValidationError::empty_field("password").into());
        }

        let body = json!({
            "email": email.as_str(),
            "name": cmd.name.trim(),
            "password": cmd.password.expose_secret(),
        });
        let response = self
            .facade
            .execute(operations::SIGN_UP, |ctx| async move {
                ctx.send(ApiRequest::post(SIGNUP_PATH, body)).await
            })
            .await?;

        tracing::info!(email = %email, "Account registered");
        Ok(response
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

/// Handler answering whether an email can still be registered.
pub struct CheckEmailAvailabilityHandler {
    facade: Arc<ServiceFacade>,
}

impl CheckEmailAvailabilityHandler {
    pub fn new(facade: Arc<ServiceFacade>) -> Self {
        Self { facade }
    }

    /// Returns `true` when no account uses `email`.
    pub async fn handle(&self, email: &str) -> Result<bool, AccountError> {
        let email = SubjectId::new(email)?;
        let request = ApiRequest::get(CHECK_EMAIL_PATH).query("email", email.as_str());

        let response = self
            .facade
            .execute(operations::CHECK_EMAIL_AVAILABILITY, |ctx| async move {
                ctx.send(request).await
            })
            .await?;

        payload(response)
            .get("duplicated")
            .and_then(Value::as_bool)
            .map(|duplicated| !duplicated)
            .ok_or_else(|| AccountError::MalformedResponse("missing duplicated flag".to_string()))
    }
}
