//! LottoMate - wires configuration, storage, and the facade together.

use std::sync::Arc;

use crate::adapters::{FileSessionStorage, HttpClientError, InMemorySessionStorage, ReqwestExecutor};
use crate::application::{
    CheckEmailAvailabilityHandler, CheckoutSettings, CompleteOAuthSignInHandler, ServiceFacade,
    SessionStore, SignInHandler, SignUpHandler, StartCheckoutHandler, SubscriptionApi,
};
use crate::config::{AppConfig, ConfigError};
use crate::domain::foundation::ValidationError;
use crate::ports::{PaymentGateway, RequestExecutor};

/// Errors while assembling the client.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] HttpClientError),

    #[error("Facade initialization failed: {0}")]
    Initialization(#[from] ValidationError),
}

/// A ready client: restored session, ready facade, and the handlers on top.
pub struct LottoMate {
    facade: Arc<ServiceFacade>,
    gateway: Arc<dyn PaymentGateway>,
    checkout_settings: CheckoutSettings,
}

impl LottoMate {
    /// Restores the session from the configured tiers and readies the facade
    /// with a reqwest executor.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub async fn connect(
        config: &AppConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, BootstrapError> {
        config
            .validate()
            .map_err(|e| BootstrapError::Config(e.into()))?;

        let executor = ReqwestExecutor::new(
            config.api.resolved_base_url(),
            config.api.request_timeout(),
        )?;
        Self::with_executor(config, Arc::new(executor), gateway).await
    }

    /// Same as [`LottoMate::connect`] with a caller-supplied executor.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Initialization` only if the facade was
    /// already initialized, which cannot happen for a fresh client.
    pub async fn with_executor(
        config: &AppConfig,
        executor: Arc<dyn RequestExecutor>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, BootstrapError> {
        let store = SessionStore::restore(
            Arc::new(FileSessionStorage::new(&config.session.storage_path)),
            Arc::new(InMemorySessionStorage::new()),
        )
        .await;

        let facade = Arc::new(ServiceFacade::new(
            Arc::new(store),
            config.session.refresh_policy(),
        ));
        facade.begin_initialization()?;
        facade.complete_initialization(executor)?;

        tracing::info!(
            base_url = config.api.resolved_base_url(),
            authenticated = facade.is_authenticated(),
            "LottoMate client ready"
        );

        Ok(Self {
            facade,
            gateway,
            checkout_settings: config.gateway.checkout_settings(),
        })
    }

    pub fn facade(&self) -> &Arc<ServiceFacade> {
        &self.facade
    }

    pub fn subscriptions(&self) -> SubscriptionApi {
        SubscriptionApi::new(self.facade.clone())
    }

    pub fn sign_in(&self) -> SignInHandler {
        SignInHandler::new(self.facade.clone())
    }

    pub fn sign_up(&self) -> SignUpHandler {
        SignUpHandler::new(self.facade.clone())
    }

    pub fn email_availability(&self) -> CheckEmailAvailabilityHandler {
        CheckEmailAvailabilityHandler::new(self.facade.clone())
    }

    pub fn oauth_callback(&self) -> CompleteOAuthSignInHandler {
        CompleteOAuthSignInHandler::new(self.facade.clone())
    }

    pub fn checkout(&self) -> StartCheckoutHandler {
        StartCheckoutHandler::new(
            self.facade.clone(),
            self.gateway.clone(),
            self.checkout_settings.clone(),
        )
    }
}
