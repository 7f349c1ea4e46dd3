//! Entitlement store: the single owner of subscription state

use std::sync::Arc;

use async_lock::Mutex;
use chrono::{DateTime, Utc};
use rigmarket_core::effects::{PhysicalTimeEffects, StorageEffects};
use rigmarket_core::reactive::Binding;

use super::persistence::{self, SUBSCRIPTION_KEY, USAGE_KEY};
use super::plans::{MeteredAction, PlanTier};
use super::subscription::SubscriptionData;
use super::EntitlementError;

/// Tracks plan and usage for the local install.
///
/// Reads are synchronous against the in-memory state. Every mutation runs
/// under one async lock, updates the binding, then writes both records to
/// storage. Write failures are logged and the in-memory state stays
/// authoritative for the session.
pub struct EntitlementStore {
    storage: Arc<dyn StorageEffects>,
    clock: Arc<dyn PhysicalTimeEffects>,
    state: Binding<SubscriptionData>,
    mutation: Mutex<()>,
}

impl EntitlementStore {
    /// Load persisted state, creating a free plan on first launch.
    ///
    /// Usage is rolled over before returning if the window has elapsed.
    pub async fn load(
        storage: Arc<dyn StorageEffects>,
        clock: Arc<dyn PhysicalTimeEffects>,
    ) -> Result<Self, EntitlementError> {
        let now = now(clock.as_ref()).await?;
        let (mut data, dirty) = match persistence::read_state(storage.as_ref(), now).await? {
            Some(data) => (data, false),
            None => {
                tracing::debug!("no stored subscription, starting on free plan");
                (SubscriptionData::new_free(now), true)
            }
        };

        let rolled = data.roll_over_if_due(now);
        if rolled {
            tracing::info!(plan = %data.plan(), "usage window elapsed, counters reset");
        }

        let store = Self::with_state(storage, clock, data);
        if dirty || rolled {
            store.persist(&store.snapshot()).await;
        }
        Ok(store)
    }

    /// Start from a fresh free plan, overwriting whatever is stored.
    pub async fn fresh(
        storage: Arc<dyn StorageEffects>,
        clock: Arc<dyn PhysicalTimeEffects>,
    ) -> Result<Self, EntitlementError> {
        let now = now(clock.as_ref()).await?;
        let store = Self::with_state(storage, clock, SubscriptionData::new_free(now));
        store.persist(&store.snapshot()).await;
        Ok(store)
    }

    fn with_state(
        storage: Arc<dyn StorageEffects>,
        clock: Arc<dyn PhysicalTimeEffects>,
        data: SubscriptionData,
    ) -> Self {
        Self {
            storage,
            clock,
            state: Binding::new(data),
            mutation: Mutex::new(()),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SubscriptionData {
        self.state.get()
    }

    /// Observable state for screens
    pub fn binding(&self) -> Binding<SubscriptionData> {
        self.state.clone()
    }

    /// Current plan
    pub fn plan(&self) -> PlanTier {
        self.state.with(SubscriptionData::plan)
    }

    /// Whether one more `action` fits in the quota
    pub fn can_use(&self, action: MeteredAction) -> bool {
        self.state.with(|data| data.can_use(action))
    }

    /// Uses of `action` left, `None` for unlimited
    pub fn remaining(&self, action: MeteredAction) -> Option<u32> {
        self.state.with(|data| data.remaining(action))
    }

    /// Share of the `action` quota consumed, in `[0, 100]`
    pub fn usage_percentage(&self, action: MeteredAction) -> f64 {
        self.state.with(|data| data.usage_percentage(action))
    }

    /// Count one use of `action`.
    ///
    /// Returns `false` without touching state or storage when the quota is
    /// exhausted.
    pub async fn consume(&self, action: MeteredAction) -> bool {
        let _guard = self.mutation.lock().await;

        let mut data = self.snapshot();
        if !data.record_use(action) {
            tracing::debug!(%action, plan = %data.plan(), "quota exhausted");
            return false;
        }

        tracing::debug!(
            %action,
            used = data.usage().used(action),
            "metered action consumed"
        );
        self.state.set(data.clone());
        self.persist(&data).await;
        true
    }

    /// Switch to `plan` for one calendar month. Usage carries over.
    pub async fn upgrade(&self, plan: PlanTier) -> Result<(), EntitlementError> {
        let _guard = self.mutation.lock().await;
        let now = now(self.clock.as_ref()).await?;

        let mut data = self.snapshot();
        let previous = data.plan();
        data.change_plan(plan, now);

        tracing::info!(from = %previous, to = %plan, "plan changed");
        self.state.set(data.clone());
        self.persist(&data).await;
        Ok(())
    }

    /// Zero both counters and start a new window now.
    pub async fn reset_usage(&self) -> Result<(), EntitlementError> {
        let _guard = self.mutation.lock().await;
        let now = now(self.clock.as_ref()).await?;

        let mut data = self.snapshot();
        data.reset_usage(now);

        tracing::debug!("usage reset");
        self.state.set(data.clone());
        self.persist(&data).await;
        Ok(())
    }

    /// Reset usage if the rolling window has elapsed, e.g. on app resume.
    pub async fn roll_over_if_due(&self) -> Result<bool, EntitlementError> {
        let _guard = self.mutation.lock().await;
        let now = now(self.clock.as_ref()).await?;

        let mut data = self.snapshot();
        if !data.roll_over_if_due(now) {
            return Ok(false);
        }

        tracing::info!(plan = %data.plan(), "usage window elapsed, counters reset");
        self.state.set(data.clone());
        self.persist(&data).await;
        Ok(true)
    }

    async fn persist(&self, data: &SubscriptionData) {
        let (subscription, usage) = match persistence::encode(data) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode subscription state");
                return;
            }
        };

        if let Err(err) = self.storage.store(SUBSCRIPTION_KEY, subscription).await {
            tracing::warn!(key = SUBSCRIPTION_KEY, error = %err, "failed to save subscription");
        }
        if let Err(err) = self.storage.store(USAGE_KEY, usage).await {
            tracing::warn!(key = USAGE_KEY, error = %err, "failed to save usage");
        }
    }
}

async fn now(clock: &dyn PhysicalTimeEffects) -> Result<DateTime<Utc>, EntitlementError> {
    Ok(clock.physical_time().await?.to_utc())
}

impl std::fmt::Debug for EntitlementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementStore")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}
