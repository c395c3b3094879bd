//! SessionStore - the single owner of the current session.
//!
//! Reads are synchronous snapshots. Writes are serialized through an async
//! gate so storage and memory always change in the same order, and observers
//! are notified after each committed change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use crate::domain::foundation::{SubjectId, ValidationError};
use crate::domain::session::{keys, PersistencePreference, Session, SessionEvent};
use crate::ports::{SessionObserver, SessionStorage, StorageError};

/// Errors raised while establishing or renewing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Failed to persist session to {tier} storage: {source}")]
    Persistence {
        tier: &'static str,
        #[source]
        source: StorageError,
    },
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Holds the current session and mirrors it into one of two storage tiers.
pub struct SessionStore {
    durable: Arc<dyn SessionStorage>,
    ephemeral: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
    write_gate: Mutex<()>,
    observers: RwLock<Vec<(ObserverId, Arc<dyn SessionObserver>)>>,
    next_observer: AtomicU64,
}

impl SessionStore {
    /// Creates an anonymous store without reading either tier.
    pub fn new(durable: Arc<dyn SessionStorage>, ephemeral: Arc<dyn SessionStorage>) -> Self {
        Self {
            durable,
            ephemeral,
            current: RwLock::new(None),
            write_gate: Mutex::new(()),
            observers: RwLock::new(Vec::new()),
            next_observer: AtomicU64::new(1),
        }
    }

    /// Creates a store holding whatever session the tiers already contain.
    ///
    /// The durable tier wins over the ephemeral one. A tier holding only part
    /// of a session is scrubbed and ignored.
    pub async fn restore(
        durable: Arc<dyn SessionStorage>,
        ephemeral: Arc<dyn SessionStorage>,
    ) -> Self {
        let store = Self::new(durable, ephemeral);

        let tiers = [
            (store.durable.clone(), PersistencePreference::Durable),
            (store.ephemeral.clone(), PersistencePreference::Ephemeral),
        ];
        for (tier, persistence) in tiers {
            if let Some(session) = Self::read_tier(tier.as_ref(), persistence).await {
                tracing::debug!(
                    subject = %session.subject_id(),
                    tier = tier.tier_name(),
                    "Restored session from storage"
                );
                *store.write_current() = Some(session);
                break;
            }
        }

        store
    }

    async fn read_tier(
        tier: &dyn SessionStorage,
        persistence: PersistencePreference,
    ) -> Option<Session> {
        let read = async {
            Ok::<_, StorageError>((
                tier.get(keys::TOKEN).await?,
                tier.get(keys::REFRESH_TOKEN).await?,
                tier.get(keys::EMAIL).await?,
            ))
        };

        let (token, refresh, email) = match read.await {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(tier = tier.tier_name(), "Failed to read stored session: {}", e);
                return None;
            }
        };

        match (token, refresh, email) {
            (None, None, None) => None,
            (Some(token), Some(refresh), Some(email))
                if !token.is_empty() && !refresh.is_empty() =>
            {
                match SubjectId::new(email) {
                    Ok(subject) => Some(Session::new(subject, token, refresh, persistence)),
                    Err(e) => {
                        tracing::warn!(tier = tier.tier_name(), "Discarding stored session: {}", e);
                        Self::scrub(tier).await;
                        None
                    }
                }
            }
            _ => {
                tracing::warn!(
                    tier = tier.tier_name(),
                    "Discarding partially stored session"
                );
                Self::scrub(tier).await;
                None
            }
        }
    }

    fn read_current(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_current(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn tier(&self, persistence: PersistencePreference) -> &Arc<dyn SessionStorage> {
        match persistence {
            PersistencePreference::Durable => &self.durable,
            PersistencePreference::Ephemeral => &self.ephemeral,
        }
    }

    /// The current session, or `None` when anonymous.
    pub fn get_session(&self) -> Option<Session> {
        self.read_current().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_current().is_some()
    }

    /// Replaces the session and persists it to the tier `persistence` selects.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invalid` for a blank subject or credential and
    /// `SessionError::Persistence` if the tier rejects the write; in both
    /// cases the previous session stays current.
    pub async fn set_session(
        &self,
        subject_id: &str,
        access_credential: &str,
        refresh_credential: &str,
        persistence: PersistencePreference,
    ) -> Result<(), SessionError> {
        let subject = SubjectId::new(subject_id)?;
        if access_credential.trim().is_empty() {
            return Err(ValidationError::empty_field("access_credential").into());
        }
        if refresh_credential.trim().is_empty() {
            return Err(ValidationError::empty_field("refresh_credential").into());
        }
        let session = Session::new(subject, access_credential, refresh_credential, persistence);

        let _gate = self.write_gate.lock().await;
        let previous = self.get_session();

        // 1. Persist to the chosen tier
        if let Err(source) = Self::write_tier(self.tier(persistence).as_ref(), &session).await {
            self.rollback(persistence, previous.as_ref()).await;
            return Err(SessionError::Persistence {
                tier: self.tier(persistence).tier_name(),
                source,
            });
        }

        // 2. The other tier must not keep an older session
        let other = match persistence {
            PersistencePreference::Durable => PersistencePreference::Ephemeral,
            PersistencePreference::Ephemeral => PersistencePreference::Durable,
        };
        Self::scrub(self.tier(other).as_ref()).await;

        // 3. Commit and notify
        let event = SessionEvent::Started {
            subject_id: session.subject_id().clone(),
            persistence,
        };
        *self.write_current() = Some(session);
        tracing::info!(subject = %subject_id, ?persistence, "Session started");
        self.notify(&event);

        Ok(())
    }

    /// Replaces both credentials of `expected` in place.
    ///
    /// Returns `Ok(false)` without writing when the current session is no
    /// longer `expected`: a refresh finishing after a logout never resurrects
    /// the session, and one finishing after another login never overwrites it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persistence` if the session's tier rejects the
    /// write; the current session is left unchanged.
    pub async fn renew_credentials(
        &self,
        expected: &Session,
        access_credential: &str,
        refresh_credential: &str,
    ) -> Result<bool, SessionError> {
        let _gate = self.write_gate.lock().await;
        let Some(current) = self.get_session().filter(|c| c.is_same_as(expected)) else {
            tracing::debug!(subject = %expected.subject_id(), "Session changed before renewal, discarding credentials");
            return Ok(false);
        };

        let renewed = current.with_credentials(access_credential, refresh_credential);
        let tier = self.tier(current.persistence());
        if let Err(source) = Self::write_tier(tier.as_ref(), &renewed).await {
            self.rollback(current.persistence(), Some(&current)).await;
            return Err(SessionError::Persistence {
                tier: tier.tier_name(),
                source,
            });
        }

        let event = SessionEvent::Renewed {
            subject_id: renewed.subject_id().clone(),
        };
        *self.write_current() = Some(renewed);
        tracing::debug!(subject = %current.subject_id(), "Session credentials renewed");
        self.notify(&event);

        Ok(true)
    }

    /// Wipes the session from memory and both tiers. Never fails.
    pub async fn clear_session(&self) {
        let _gate = self.write_gate.lock().await;
        self.end_current().await;
    }

    /// Wipes the session only while it is still `expected`.
    ///
    /// Returns whether anything was cleared. A newer session is left alone.
    pub async fn clear_session_if(&self, expected: &Session) -> bool {
        let _gate = self.write_gate.lock().await;
        if !self.get_session().is_some_and(|c| c.is_same_as(expected)) {
            tracing::debug!(subject = %expected.subject_id(), "Session changed, not clearing");
            return false;
        }
        self.end_current().await;
        true
    }

    /// Caller holds the write gate.
    async fn end_current(&self) {
        let previous = self.write_current().take();

        Self::scrub(self.durable.as_ref()).await;
        Self::scrub(self.ephemeral.as_ref()).await;

        if let Some(previous) = previous {
            tracing::info!(subject = %previous.subject_id(), "Session ended");
            self.notify(&SessionEvent::Ended {
                subject_id: previous.subject_id().clone(),
            });
        }
    }

    /// Registers an observer for session changes.
    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    /// Removes an observer; returns whether it was registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn notify(&self, event: &SessionEvent) {
        let observers: Vec<Arc<dyn SessionObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, o)| o.clone())
            .collect();
        for observer in observers {
            observer.on_session_event(event);
        }
    }

    async fn write_tier(tier: &dyn SessionStorage, session: &Session) -> Result<(), StorageError> {
        for (key, value) in session.to_entries() {
            tier.set(key, &value).await?;
        }
        Ok(())
    }

    /// Puts a tier back the way it was after a failed write.
    async fn rollback(&self, persistence: PersistencePreference, previous: Option<&Session>) {
        let tier = self.tier(persistence);
        Self::scrub(tier.as_ref()).await;
        if let Some(previous) = previous.filter(|p| p.persistence() == persistence) {
            if let Err(e) = Self::write_tier(tier.as_ref(), previous).await {
                tracing::warn!(
                    tier = tier.tier_name(),
                    "Failed to restore previous session after write error: {}",
                    e
                );
            }
        }
    }

    async fn scrub(tier: &dyn SessionStorage) {
        for key in keys::ALL {
            if let Err(e) = tier.remove(key).await {
                tracing::warn!(tier = tier.tier_name(), key, "Failed to remove session key: {}", e);
            }
        }
    }
}
