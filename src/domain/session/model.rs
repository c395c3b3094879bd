//! Session value types.

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::SubjectId;

/// Fixed storage keys for the flat session layout.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const EMAIL: &str = "email";
    pub const REMEMBER_ME: &str = "rememberMe";

    /// Every key a session occupies in a storage tier.
    pub const ALL: [&str; 4] = [TOKEN, REFRESH_TOKEN, EMAIL, REMEMBER_ME];
}

/// Where the session is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistencePreference {
    /// Survives restarts.
    Durable,
    /// Lives only as long as the ephemeral tier does.
    #[default]
    Ephemeral,
}

impl PersistencePreference {
    /// Maps the "remember me" checkbox onto a tier.
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            Self::Durable
        } else {
            Self::Ephemeral
        }
    }

    pub fn remember_me(&self) -> bool {
        matches!(self, Self::Durable)
    }

    /// Value stored under the `rememberMe` key.
    pub fn as_flag(&self) -> &'static str {
        if self.remember_me() {
            "true"
        } else {
            "false"
        }
    }
}

/// A live authenticated session.
///
/// Both credentials are always present; an anonymous context is modelled as
/// the absence of a `Session`, never as a session with missing fields.
#[derive(Debug, Clone)]
pub struct Session {
    subject_id: SubjectId,
    access_credential: Secret<String>,
    refresh_credential: Secret<String>,
    persistence: PersistencePreference,
}

impl Session {
    pub fn new(
        subject_id: SubjectId,
        access_credential: impl Into<String>,
        refresh_credential: impl Into<String>,
        persistence: PersistencePreference,
    ) -> Self {
        Self {
            subject_id,
            access_credential: Secret::new(access_credential.into()),
            refresh_credential: Secret::new(refresh_credential.into()),
            persistence,
        }
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn access_credential(&self) -> &str {
        self.access_credential.expose_secret()
    }

    pub fn refresh_credential(&self) -> &str {
        self.refresh_credential.expose_secret()
    }

    pub fn persistence(&self) -> PersistencePreference {
        self.persistence
    }

    /// Returns a copy with both credentials replaced.
    pub fn with_credentials(
        &self,
        access_credential: impl Into<String>,
        refresh_credential: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: self.subject_id.clone(),
            access_credential: Secret::new(access_credential.into()),
            refresh_credential: Secret::new(refresh_credential.into()),
            persistence: self.persistence,
        }
    }

    /// Whether `other` is this very session: same subject, same credentials.
    ///
    /// Used to check that a write started against one session still applies.
    pub fn is_same_as(&self, other: &Session) -> bool {
        self.subject_id == other.subject_id
            && self.access_credential() == other.access_credential()
            && self.refresh_credential() == other.refresh_credential()
    }

    /// Flat key/value pairs for the storage tier.
    pub fn to_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (keys::TOKEN, self.access_credential().to_string()),
            (keys::REFRESH_TOKEN, self.refresh_credential().to_string()),
            (keys::EMAIL, self.subject_id.as_str().to_string()),
            (keys::REMEMBER_ME, self.persistence.as_flag().to_string()),
        ]
    }
}

/// Notification delivered to session observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user signed in.
    Started {
        subject_id: SubjectId,
        persistence: PersistencePreference,
    },
    /// Credentials were replaced by a refresh.
    Renewed { subject_id: SubjectId },
    /// The session was cleared (logout or failed refresh).
    Ended { subject_id: SubjectId },
}
