//! AppCore - the assembled application core
//!
//! Frontends build one [`AppCore`] at startup from a validated config and a
//! bundle of effect handlers, then reach every service through it.

use std::sync::Arc;

use rigmarket_core::effects::{
    AuthEffects, MarketplaceEffects, PhysicalTimeEffects, RealtimeEffects, StorageEffects,
};

use crate::config::AppConfig;
use crate::entitlements::{EntitlementError, EntitlementStore};
use crate::errors::AppResult;
use crate::queries::DataQueries;
use crate::review::ReviewPromptWatcher;
use crate::workflows::AuthFlow;

/// Effect handlers the core runs on
#[derive(Clone)]
pub struct AppEffects {
    /// Durable key-value storage
    pub storage: Arc<dyn StorageEffects>,
    /// Wall clock
    pub clock: Arc<dyn PhysicalTimeEffects>,
    /// Auth provider
    pub auth: Arc<dyn AuthEffects>,
    /// Marketplace backend
    pub marketplace: Arc<dyn MarketplaceEffects>,
    /// Realtime push channel
    pub realtime: Arc<dyn RealtimeEffects>,
}

/// The application core
pub struct AppCore {
    config: AppConfig,
    effects: AppEffects,
    entitlements: EntitlementStore,
    auth: AuthFlow,
    queries: DataQueries,
}

impl AppCore {
    /// Validate `config` and start every service.
    ///
    /// Unreadable entitlement records are logged and replaced with a fresh
    /// free plan. Only a failing clock aborts startup.
    pub async fn bootstrap(config: AppConfig, effects: AppEffects) -> AppResult<Self> {
        config.validate()?;

        let entitlements =
            match EntitlementStore::load(effects.storage.clone(), effects.clock.clone()).await {
                Ok(store) => store,
                Err(err @ EntitlementError::Clock(_)) => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(error = %err, "discarding stored entitlements");
                    EntitlementStore::fresh(effects.storage.clone(), effects.clock.clone()).await?
                }
            };

        let queries = DataQueries::new(
            effects.marketplace.clone(),
            effects.auth.clone(),
            effects.realtime.clone(),
            config.request_timeout(),
        );
        let auth = AuthFlow::new(effects.auth.clone());

        tracing::info!(plan = %entitlements.plan(), "app core ready");
        Ok(Self {
            config,
            effects,
            entitlements,
            auth,
            queries,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Effect handlers
    pub fn effects(&self) -> &AppEffects {
        &self.effects
    }

    /// Marketplace backend, for workflows
    pub fn marketplace(&self) -> &dyn MarketplaceEffects {
        self.effects.marketplace.as_ref()
    }

    /// Subscription and usage tracking
    pub fn entitlements(&self) -> &EntitlementStore {
        &self.entitlements
    }

    /// Sign-in state
    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    /// Data hook factory
    pub fn queries(&self) -> &DataQueries {
        &self.queries
    }

    /// New review prompt watcher for a chat screen
    pub fn review_watcher(&self) -> ReviewPromptWatcher {
        ReviewPromptWatcher::new(self.effects.marketplace.clone(), self.config.request_timeout())
    }
}

impl std::fmt::Debug for AppCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCore")
            .field("config", &self.config)
            .field("entitlements", &self.entitlements)
            .finish_non_exhaustive()
    }
}
