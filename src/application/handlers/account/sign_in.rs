//! SignInHandler - exchanges email and password for a session.

use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use std::sync::Arc;

use super::AccountError;
use crate::application::credential_manager::parse_token_pair;
use crate::application::operations;
use crate::application::service_facade::ServiceFacade;
use crate::domain::foundation::{SubjectId, ValidationError};
use crate::domain::session::PersistencePreference;
use crate::ports::ApiRequest;

const LOGIN_PATH: &str = "auth/login";

/// Command to sign in with a password.
#[derive(Debug, Clone)]
pub struct SignInCommand {
    pub email: String,
    pub password: Secret<String>,
    /// Keep the session across restarts.
    pub remember_me: bool,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub subject_id: SubjectId,
    pub persistence: PersistencePreference,
}

/// Handler for password sign-in.
pub struct SignInHandler {
    facade: Arc<ServiceFacade>,
}

impl SignInHandler {
    pub fn new(facade: Arc<ServiceFacade>) -> Self {
        Self { facade }
    }

    pub async fn handle(&self, cmd: SignInCommand) -> Result<SignInResult, AccountError> {
        // 1. Validate input
        let subject_id = SubjectId::new(cmd.email)?;
        if cmd.password.expose_secret().is_empty() {
            return Err(ValidationError::empty_field("password").into());
        }

        // 2. Authenticate
        let body = json!({
            "email": subject_id.as_str(),
            "password": cmd.password.expose_secret(),
        });
        let response = self
            .facade
            .execute(operations::SIGN_IN, |ctx| async move {
                ctx.send(ApiRequest::post(LOGIN_PATH, body)).await
            })
            .await?;

        // 3. Establish the session
        let pair = parse_token_pair(&response)
            .ok_or_else(|| AccountError::MalformedResponse("missing accessToken".to_string()))?;
        let refresh = pair
            .refresh
            .ok_or_else(|| AccountError::MalformedResponse("missing refreshToken".to_string()))?;
        let persistence = PersistencePreference::from_remember_me(cmd.remember_me);

        self.facade
            .login(subject_id.as_str(), &pair.access, &refresh, persistence)
            .await?;

        Ok(SignInResult {
            subject_id,
            persistence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::MockRequestExecutor;
    use crate::adapters::storage::InMemorySessionStorage;
    use crate::application::credential_manager::RefreshPolicy;
    use crate::application::session_store::SessionStore;
    use crate::domain::foundation::ErrorKind;
    use crate::ports::{HttpMethod, TransportError};

    fn setup() -> (SignInHandler, Arc<ServiceFacade>, Arc<MockRequestExecutor>) {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionStorage::new()),
            Arc::new(InMemorySessionStorage::new()),
        ));
        let facade = Arc::new(ServiceFacade::new(store, RefreshPolicy::default()));
        let executor = Arc::new(MockRequestExecutor::new());
        facade.complete_initialization(executor.clone()).unwrap();
        (SignInHandler::new(facade.clone()), facade, executor)
    }

    fn cmd(remember_me: bool) -> SignInCommand {
        SignInCommand {
            email: "user@example.com".into(),
            password: Secret::new("hunter2".into()),
            remember_me,
        }
    }

    #[tokio::test]
    async fn remember_me_signs_in_durably() {
        let (handler, facade, executor) = setup();
        executor.respond(
            HttpMethod::Post,
            LOGIN_PATH,
            Ok(json!({ "data": { "accessToken": "a1", "refreshToken": "r1" }, "message": "ok" })),
        );

        let result = handler.handle(cmd(true)).await.unwrap();

        assert_eq!(result.persistence, PersistencePreference::Durable);
        let session = facade.session().unwrap();
        assert_eq!(session.access_credential(), "a1");
        assert_eq!(session.persistence(), PersistencePreference::Durable);

        let call = executor.last_call_to(LOGIN_PATH).unwrap();
        assert_eq!(
            call.body,
            Some(json!({ "email": "user@example.com", "password": "hunter2" }))
        );
    }

    #[tokio::test]
    async fn without_remember_me_session_is_ephemeral() {
        let (handler, facade, executor) = setup();
        executor.respond(
            HttpMethod::Post,
            LOGIN_PATH,
            Ok(json!({ "data": { "accessToken": "a1", "refreshToken": "r1" } })),
        );

        handler.handle(cmd(false)).await.unwrap();

        assert_eq!(
            facade.session().unwrap().persistence(),
            PersistencePreference::Ephemeral
        );
    }

    #[tokio::test]
    async fn rejection_passes_server_message_through() {
        let (handler, facade, executor) = setup();
        executor.respond(
            HttpMethod::Post,
            LOGIN_PATH,
            Err(TransportError::Status {
                status: 401,
                body: json!({ "message": "Invalid email or password" }),
            }),
        );

        let err = handler.handle(cmd(true)).await.unwrap_err();

        match err {
            AccountError::Service(e) => {
                assert_eq!(e.kind, ErrorKind::BusinessRejection);
                assert_eq!(e.message, "Invalid email or password");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!facade.is_authenticated());
    }

    #[tokio::test]
    async fn response_without_tokens_creates_no_session() {
        let (handler, facade, executor) = setup();
        executor.respond(HttpMethod::Post, LOGIN_PATH, Ok(json!({ "data": { "accessToken": "a1" } })));

        let err = handler.handle(cmd(true)).await.unwrap_err();

        assert!(matches!(err, AccountError::MalformedResponse(_)));
        assert!(!facade.is_authenticated());
    }

    #[tokio::test]
    async fn blank_email_is_rejected_locally() {
        let (handler, _facade, executor) = setup();
        let mut cmd = cmd(true);
        cmd.email = "  ".into();

        assert!(matches!(
            handler.handle(cmd).await,
            Err(AccountError::Invalid(_))
        ));
        assert!(executor.calls().is_empty());
    }
}
