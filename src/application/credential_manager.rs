//! CredentialManager - keeps the access credential usable.
//!
//! Expiry is read from the credential itself without verifying it. An expired
//! credential is exchanged once for a new pair; every caller that saw the same
//! expired credential shares that single refresh.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, PoisonError};

use super::session_store::SessionStore;
use crate::domain::foundation::Timestamp;
use crate::domain::session::{is_expired_at, Session};
use crate::ports::{ApiRequest, RequestExecutor};

/// Path of the refresh endpoint relative to the API base.
pub const DEFAULT_REFRESH_PATH: &str = "auth/refresh";

/// How and when credentials are refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub refresh_path: String,
    /// Treat credentials as expired this many seconds early.
    pub expiry_leeway_secs: i64,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            expiry_leeway_secs: 0,
        }
    }
}

/// A fresh credential pair returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    /// `None` when the server kept the current refresh credential.
    pub refresh: Option<String>,
}

/// Unwraps the `data` envelope the API puts around most payloads.
pub fn payload(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Reads `accessToken` and the optional `refreshToken` from an auth response.
pub fn parse_token_pair(value: &Value) -> Option<TokenPair> {
    let body = value.get("data").filter(|d| d.is_object()).unwrap_or(value);
    let access = body
        .get("accessToken")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    let refresh = body
        .get("refreshToken")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    Some(TokenPair {
        access: access.to_string(),
        refresh: refresh.map(str::to_string),
    })
}

type SharedRefresh = Shared<BoxFuture<'static, bool>>;

/// Decides whether the current credential is usable and refreshes it if not.
pub struct CredentialManager {
    store: Arc<SessionStore>,
    executor: Arc<dyn RequestExecutor>,
    policy: RefreshPolicy,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl CredentialManager {
    pub fn new(
        store: Arc<SessionStore>,
        executor: Arc<dyn RequestExecutor>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            executor,
            policy,
            in_flight: Mutex::new(None),
        }
    }

    /// Whether `access_credential` is expired under this manager's leeway.
    ///
    /// Undecodable credentials and credentials without `exp` are expired.
    pub fn is_expired(&self, access_credential: &str) -> bool {
        is_expired_at(
            access_credential,
            Timestamp::now(),
            self.policy.expiry_leeway_secs,
        )
    }

    /// Returns `true` when a live session with a usable access credential
    /// exists, refreshing it first if it has expired.
    ///
    /// A failed refresh ends the session it was started for, never a session
    /// established while it was in flight. Anonymous and unexpired sessions
    /// are answered without touching the network.
    pub async fn ensure_valid(&self) -> bool {
        let refresh = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

            // Read under the slot lock so a refresh that just finished is seen.
            let Some(session) = self.store.get_session() else {
                return false;
            };
            if !self.is_expired(session.access_credential()) {
                return true;
            }

            match slot.as_ref() {
                Some(pending) if pending.peek().is_none() => pending.clone(),
                _ => {
                    tracing::debug!(subject = %session.subject_id(), "Access credential expired, refreshing");
                    let refresh = Self::refresh(
                        self.store.clone(),
                        self.executor.clone(),
                        self.policy.clone(),
                        session,
                    )
                    .boxed()
                    .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        let outcome = refresh.clone().await;

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|s| s.ptr_eq(&refresh)) {
            *slot = None;
        }
        outcome
    }

    async fn refresh(
        store: Arc<SessionStore>,
        executor: Arc<dyn RequestExecutor>,
        policy: RefreshPolicy,
        session: Session,
    ) -> bool {
        let request = ApiRequest::post(
            &policy.refresh_path,
            json!({ "refreshToken": session.refresh_credential() }),
        );

        // 1. Exchange the refresh credential
        let pair = match executor.request(request).await {
            Ok(body) => parse_token_pair(&body),
            Err(e) => {
                tracing::warn!(
                    subject = %session.subject_id(),
                    status = ?e.status(),
                    "Credential refresh failed: {}",
                    e
                );
                store.clear_session_if(&session).await;
                return false;
            }
        };

        // 2. The new pair must be usable
        let Some(pair) = pair else {
            tracing::warn!(subject = %session.subject_id(), "Refresh response carried no access credential");
            store.clear_session_if(&session).await;
            return false;
        };
        if is_expired_at(&pair.access, Timestamp::now(), policy.expiry_leeway_secs) {
            tracing::warn!(subject = %session.subject_id(), "Refresh returned an already expired credential");
            store.clear_session_if(&session).await;
            return false;
        }

        // 3. Swap it into the store
        let refresh_credential = pair
            .refresh
            .unwrap_or_else(|| session.refresh_credential().to_string());
        match store.renew_credentials(&session, &pair.access, &refresh_credential).await {
            Ok(renewed) => renewed,
            Err(e) => {
                tracing::warn!(subject = %session.subject_id(), "Failed to store refreshed credentials: {}", e);
                store.clear_session_if(&session).await;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::MockRequestExecutor;
    use crate::adapters::storage::InMemorySessionStorage;
    use crate::domain::session::PersistencePreference;
    use crate::ports::{HttpMethod, TransportError};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(exp_offset_secs: i64) -> String {
        let claims = json!({
            "sub": "user@example.com",
            "exp": Timestamp::now().unix_seconds() + exp_offset_secs,
        });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    async fn setup(access: &str) -> (Arc<SessionStore>, Arc<MockRequestExecutor>, CredentialManager) {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionStorage::new()),
            Arc::new(InMemorySessionStorage::new()),
        ));
        store
            .set_session("user@example.com", access, "r1", PersistencePreference::Durable)
            .await
            .unwrap();
        let executor = Arc::new(MockRequestExecutor::new());
        let manager = CredentialManager::new(store.clone(), executor.clone(), RefreshPolicy::default());
        (store, executor, manager)
    }

    #[test]
    fn token_pair_reads_enveloped_and_flat_bodies() {
        let enveloped = json!({ "data": { "accessToken": "a", "refreshToken": "r" } });
        let flat = json!({ "accessToken": "a" });

        assert_eq!(
            parse_token_pair(&enveloped),
            Some(TokenPair {
                access: "a".into(),
                refresh: Some("r".into())
            })
        );
        assert_eq!(
            parse_token_pair(&flat),
            Some(TokenPair {
                access: "a".into(),
                refresh: None
            })
        );
        assert_eq!(parse_token_pair(&json!({ "data": {} })), None);
    }

    #[test]
    fn payload_unwraps_data() {
        assert_eq!(payload(json!({ "data": [1, 2] })), json!([1, 2]));
        assert_eq!(payload(json!([1])), json!([1]));
    }

    #[tokio::test]
    async fn anonymous_is_invalid_without_network() {
        let store = Arc::new(SessionStore::new(
            Arc::new(InMemorySessionStorage::new()),
            Arc::new(InMemorySessionStorage::new()),
        ));
        let executor = Arc::new(MockRequestExecutor::new());
        let manager = CredentialManager::new(store, executor.clone(), RefreshPolicy::default());

        assert!(!manager.ensure_valid().await);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn unexpired_credential_is_valid_without_network() {
        let (_store, executor, manager) = setup(&token(3600)).await;
        assert!(manager.ensure_valid().await);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn leeway_expires_credentials_early() {
        let (store, executor, _) = setup(&token(30)).await;
        let manager = CredentialManager::new(
            store,
            executor,
            RefreshPolicy {
                expiry_leeway_secs: 60,
                ..RefreshPolicy::default()
            },
        );
        assert!(manager.is_expired(&token(30)));
        assert!(!manager.is_expired(&token(120)));
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed() {
        let (store, executor, manager) = setup(&token(-10)).await;
        let fresh = token(3600);
        executor.respond(
            HttpMethod::Post,
            "auth/refresh",
            Ok(json!({ "data": { "accessToken": fresh, "refreshToken": "r2" } })),
        );

        assert!(manager.ensure_valid().await);

        let session = store.get_session().unwrap();
        assert_eq!(session.access_credential(), fresh);
        assert_eq!(session.refresh_credential(), "r2");
        let call = executor.last_call_to("auth/refresh").unwrap();
        assert_eq!(call.body, Some(json!({ "refreshToken": "r1" })));
    }

    #[tokio::test]
    async fn missing_refresh_token_keeps_the_old_one() {
        let (store, executor, manager) = setup(&token(-10)).await;
        executor.respond(
            HttpMethod::Post,
            "auth/refresh",
            Ok(json!({ "accessToken": token(3600) })),
        );

        assert!(manager.ensure_valid().await);
        assert_eq!(store.get_session().unwrap().refresh_credential(), "r1");
    }

    #[tokio::test]
    async fn rejected_refresh_ends_session() {
        let (store, executor, manager) = setup(&token(-10)).await;
        executor.respond(
            HttpMethod::Post,
            "auth/refresh",
            Err(TransportError::Status {
                status: 401,
                body: json!({ "message": "refresh token expired" }),
            }),
        );

        assert!(!manager.ensure_valid().await);
        assert!(store.get_session().is_none());
    }

    #[tokio::test]
    async fn already_expired_refresh_result_ends_session() {
        let (store, executor, manager) = setup(&token(-10)).await;
        executor.respond(
            HttpMethod::Post,
            "auth/refresh",
            Ok(json!({ "accessToken": token(-5) })),
        );

        assert!(!manager.ensure_valid().await);
        assert!(store.get_session().is_none());
    }

    async fn alice_then_bob_during_refresh(
        reply: Result<Value, TransportError>,
    ) -> (Arc<SessionStore>, bool) {
        let (store, executor, manager) = setup(&token(-10)).await;
        executor.respond(HttpMethod::Post, "auth/refresh", reply);
        executor.set_delay(std::time::Duration::from_millis(100));

        let manager = Arc::new(manager);
        let refreshing = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.ensure_valid().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        store
            .set_session("bob@example.com", "b1", "rb1", PersistencePreference::Durable)
            .await
            .unwrap();

        let outcome = refreshing.await.unwrap();
        (store, outcome)
    }

    #[tokio::test]
    async fn late_refresh_does_not_overwrite_newer_login() {
        let (store, outcome) = alice_then_bob_during_refresh(Ok(
            json!({ "accessToken": token(3600), "refreshToken": "r2" }),
        ))
        .await;

        assert!(!outcome);
        let session = store.get_session().unwrap();
        assert_eq!(session.subject_id().as_str(), "bob@example.com");
        assert_eq!(session.access_credential(), "b1");
        assert_eq!(session.refresh_credential(), "rb1");
    }

    #[tokio::test]
    async fn late_refresh_failure_does_not_end_newer_login() {
        let (store, outcome) = alice_then_bob_during_refresh(Err(TransportError::Status {
            status: 401,
            body: json!({ "message": "refresh token expired" }),
        }))
        .await;

        assert!(!outcome);
        let session = store.get_session().unwrap();
        assert_eq!(session.subject_id().as_str(), "bob@example.com");
        assert_eq!(session.access_credential(), "b1");
    }

    #[tokio::test]
    async fn garbage_credential_is_refreshed() {
        let (_store, executor, manager) = setup("not-a-jwt").await;
        executor.respond(
            HttpMethod::Post,
            "auth/refresh",
            Ok(json!({ "accessToken": token(3600) })),
        );

        assert!(manager.ensure_valid().await);
        assert_eq!(executor.calls_to("auth/refresh"), 1);
    }
}
