//! ServiceFacade - the gate every backend call passes through.
//!
//! Calls wait for the facade to be wired to a request executor, pass the auth
//! guard unless their operation is public, run with the current credential
//! attached, and come back with failures classified into `ServiceError`.

use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

use super::credential_manager::{payload, CredentialManager, RefreshPolicy};
use super::operations;
use super::session_store::{SessionError, SessionStore};
use crate::domain::foundation::{ErrorKind, ServiceError, StateMachine, ValidationError};
use crate::domain::session::{PersistencePreference, Session};
use crate::ports::{ApiRequest, RequestExecutor, TransportError};

/// Readiness of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacadeState {
    Uninitialized,
    Initializing,
    Ready,
}

impl StateMachine for FacadeState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FacadeState::*;
        matches!(
            (self, target),
            (Uninitialized, Initializing) | (Initializing, Ready)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FacadeState::*;
        match self {
            Uninitialized => vec![Initializing],
            Initializing => vec![Ready],
            Ready => vec![],
        }
    }
}

/// What becomes available once the facade is ready.
#[derive(Clone)]
struct Wiring {
    executor: Arc<dyn RequestExecutor>,
    credentials: Arc<CredentialManager>,
}

struct Readiness {
    state: FacadeState,
    wiring: Option<Wiring>,
    waiters: Vec<oneshot::Sender<Wiring>>,
}

/// Handed to an operation's thunk; sends requests with the caller's credential.
pub struct RequestContext {
    executor: Arc<dyn RequestExecutor>,
    bearer: Option<Secret<String>>,
}

impl RequestContext {
    /// Sends `request`, attaching the bearer credential if there is one.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let request = match &self.bearer {
            Some(token) => request.with_bearer(token.expose_secret()),
            None => request,
        };
        self.executor.request(request).await
    }

    /// Sends `request` and decodes its payload, unwrapping a `data` envelope.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, TransportError> {
        let path = request.path();
        let body = payload(self.send(request).await?);
        serde_json::from_value(body).map_err(|e| {
            tracing::warn!(path = %path, "Unexpected response shape: {}", e);
            TransportError::MalformedBody(e.to_string())
        })
    }
}

/// Gates backend operations behind readiness and authentication.
pub struct ServiceFacade {
    store: Arc<SessionStore>,
    policy: RefreshPolicy,
    readiness: Mutex<Readiness>,
}

impl ServiceFacade {
    pub fn new(store: Arc<SessionStore>, policy: RefreshPolicy) -> Self {
        Self {
            store,
            policy,
            readiness: Mutex::new(Readiness {
                state: FacadeState::Uninitialized,
                wiring: None,
                waiters: Vec::new(),
            }),
        }
    }

    fn readiness(&self) -> MutexGuard<'_, Readiness> {
        self.readiness.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> FacadeState {
        self.readiness().state
    }

    /// Marks the start of asynchronous setup.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` unless the facade is uninitialized.
    pub fn begin_initialization(&self) -> Result<(), ValidationError> {
        let mut readiness = self.readiness();
        readiness.state = readiness.state.transition_to(FacadeState::Initializing)?;
        Ok(())
    }

    /// Attaches the request executor and releases every waiting call.
    ///
    /// Starts initialization first if nobody did.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the facade is already ready.
    pub fn complete_initialization(
        &self,
        executor: Arc<dyn RequestExecutor>,
    ) -> Result<(), ValidationError> {
        let mut readiness = self.readiness();
        let mut state = readiness.state;
        if state == FacadeState::Uninitialized {
            state = state.transition_to(FacadeState::Initializing)?;
        }
        readiness.state = state.transition_to(FacadeState::Ready)?;

        let wiring = Wiring {
            credentials: Arc::new(CredentialManager::new(
                self.store.clone(),
                executor.clone(),
                self.policy.clone(),
            )),
            executor,
        };
        readiness.wiring = Some(wiring.clone());

        let waiters = std::mem::take(&mut readiness.waiters);
        tracing::debug!(waiters = waiters.len(), "Service facade ready");
        for waiter in waiters {
            let _ = waiter.send(wiring.clone());
        }
        Ok(())
    }

    async fn wiring(&self) -> Wiring {
        loop {
            let waiter = {
                let mut readiness = self.readiness();
                if let Some(wiring) = &readiness.wiring {
                    return wiring.clone();
                }
                let (tx, rx) = oneshot::channel();
                readiness.waiters.push(tx);
                rx
            };
            if let Ok(wiring) = waiter.await {
                return wiring;
            }
        }
    }

    /// Resolves once the facade is ready.
    pub async fn ready(&self) {
        self.wiring().await;
    }

    /// The credential manager, once ready.
    pub fn credentials(&self) -> Option<Arc<CredentialManager>> {
        self.readiness().wiring.as_ref().map(|w| w.credentials.clone())
    }

    /// Waits for readiness, then validates (and if needed refreshes) the
    /// current session.
    pub async fn ensure_valid(&self) -> bool {
        self.wiring().await.credentials.ensure_valid().await
    }

    /// Fails with `AuthRequired` unless a usable session exists.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` with kind `AuthRequired`.
    pub async fn require_session(&self) -> Result<Session, ServiceError> {
        if !self.ensure_valid().await {
            return Err(ServiceError::auth_required());
        }
        self.store.get_session().ok_or_else(ServiceError::auth_required)
    }

    /// Establishes a session from freshly issued credentials.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the values are blank or cannot be persisted.
    pub async fn login(
        &self,
        subject_id: &str,
        access_credential: &str,
        refresh_credential: &str,
        persistence: PersistencePreference,
    ) -> Result<(), SessionError> {
        self.store
            .set_session(subject_id, access_credential, refresh_credential, persistence)
            .await
    }

    pub async fn logout(&self) {
        self.store.clear_session().await;
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn session(&self) -> Option<Session> {
        self.store.get_session()
    }

    /// Runs one backend operation under the facade's policy.
    ///
    /// # Arguments
    ///
    /// * `operation` - Operation name; public names skip the auth guard
    /// * `thunk` - Builds and sends the request through the given context
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` classified from the failure. A 401 on a
    /// privileged operation also ends the session that sent it, unless a
    /// different session has replaced it in the meantime.
    pub async fn execute<T, F, Fut>(&self, operation: &str, thunk: F) -> Result<T, ServiceError>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        // 1. Wait for readiness
        let wiring = self.wiring().await;

        // 2. Auth guard
        let privileged = !operations::is_public(operation);
        if privileged && !wiring.credentials.ensure_valid().await {
            tracing::debug!(operation, "Privileged operation without a session");
            return Err(ServiceError::auth_required().with_detail("operation", operation));
        }

        // 3. Attach the current credential
        let sent_with = self
            .store
            .get_session()
            .filter(|s| !wiring.credentials.is_expired(s.access_credential()));
        if privileged && sent_with.is_none() {
            return Err(ServiceError::auth_required().with_detail("operation", operation));
        }
        let context = RequestContext {
            executor: wiring.executor,
            bearer: sent_with
                .as_ref()
                .map(|s| Secret::new(s.access_credential().to_string())),
        };

        // 4. Run and classify
        match thunk(context).await {
            Ok(value) => Ok(value),
            Err(error) => {
                let classified = Self::classify(operation, privileged, &error);
                if classified.kind == ErrorKind::SessionExpired {
                    // Only the session whose credential was rejected may end.
                    if let Some(rejected) = &sent_with {
                        if self.store.clear_session_if(rejected).await {
                            tracing::info!(operation, "Server rejected the credential, session ended");
                        }
                    }
                } else {
                    tracing::debug!(operation, kind = %classified.kind, "Operation failed: {}", error);
                }
                Err(classified)
            }
        }
    }

    /// Maps a transport failure onto the service error taxonomy.
    pub fn classify(operation: &str, privileged: bool, error: &TransportError) -> ServiceError {
        let classified = match error {
            TransportError::Status { status: 401, .. } if privileged => {
                ServiceError::session_expired().with_detail("status", "401")
            }
            TransportError::Status { status, .. } if (400..500).contains(status) => {
                let message = error
                    .server_message()
                    .unwrap_or_else(|| format!("Request rejected with status {}", status));
                ServiceError::business_rejection(message).with_detail("status", status.to_string())
            }
            TransportError::Status { status, .. } => {
                let message = error
                    .server_message()
                    .unwrap_or_else(|| format!("Server error (status {})", status));
                ServiceError::transport_failure(message).with_detail("status", status.to_string())
            }
            TransportError::NoResponse(reason) => ServiceError::transport_failure(reason.clone()),
            TransportError::MalformedBody(reason) => {
                ServiceError::transport_failure(format!("Malformed response: {}", reason))
            }
        };
        classified.with_detail("operation", operation)
    }
}
