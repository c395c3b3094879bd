//! OAuth2 sign-in: where to send the user, and what to do when they return.

use reqwest::Url;
use std::sync::Arc;

use super::AccountError;
use crate::application::service_facade::ServiceFacade;
use crate::domain::foundation::SubjectId;
use crate::domain::session::{decode_claims, PersistencePreference};

/// Social identity providers the backend brokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Kakao,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "GOOGLE",
            OAuthProvider::Kakao => "KAKAO",
        }
    }

    /// Backend URL that starts the provider's authorization flow.
    pub fn authorize_url(&self, api_base: &Url) -> Url {
        let mut url = api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["auth", "oauth2", "authorize", self.as_str()]);
        }
        url
    }
}

/// Handler for the redirect back from the OAuth2 provider.
pub struct CompleteOAuthSignInHandler {
    facade: Arc<ServiceFacade>,
}

impl CompleteOAuthSignInHandler {
    pub fn new(facade: Arc<ServiceFacade>) -> Self {
        Self { facade }
    }

    /// Signs in from the `token` and `refreshToken` query parameters of
    /// `callback_url`. The session is ephemeral.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCallback` when a parameter is missing or
    /// the access credential has no readable subject; the current session is
    /// left as it was.
    pub async fn handle(&self, callback_url: &str) -> Result<SubjectId, AccountError> {
        // 1. Read the credentials off the redirect
        let url = parse_callback(callback_url)?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };
        let token = param("token")
            .ok_or_else(|| AccountError::InvalidCallback("missing token".to_string()))?;
        let refresh = param("refreshToken")
            .ok_or_else(|| AccountError::InvalidCallback("missing refreshToken".to_string()))?;

        // 2. The subject comes from the credential itself
        let subject = decode_claims(&token)
            .ok()
            .and_then(|claims| claims.sub)
            .ok_or_else(|| AccountError::InvalidCallback("token carries no subject".to_string()))?;
        let subject_id = SubjectId::new(subject)?;

        // 3. Establish the session
        self.facade
            .login(
                subject_id.as_str(),
                &token,
                &refresh,
                PersistencePreference::Ephemeral,
            )
            .await?;

        tracing::info!(subject = %subject_id, "Signed in through OAuth2");
        Ok(subject_id)
    }
}

/// Accepts absolute URLs and bare `/path?query` redirects.
fn parse_callback(callback_url: &str) -> Result<Url, AccountError> {
    Url::parse(callback_url)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(callback_url)))
        .map_err(|e| AccountError::InvalidCallback(e.to_string()))
}
