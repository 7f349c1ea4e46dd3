//! Subscription state: plan, derived features and usage counters

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use super::plans::{MeteredAction, PlanFeatures, PlanTier};

/// Length of the rolling usage window.
///
/// Usage resets once this much time has passed since the last reset. The
/// window is not aligned to calendar months or billing dates.
pub const USAGE_WINDOW_DAYS: i64 = 30;

/// Consumption of metered actions within the current window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    /// AI builds consumed
    pub ai_builds_used: u32,
    /// AI upgrades consumed
    pub ai_upgrades_used: u32,
    /// Start of the current window
    pub last_reset_date: DateTime<Utc>,
}

impl UsageCounters {
    /// Zeroed counters with a window starting at `now`
    #[must_use]
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            ai_builds_used: 0,
            ai_upgrades_used: 0,
            last_reset_date: now,
        }
    }

    /// Uses recorded for `action`
    #[must_use]
    pub fn used(&self, action: MeteredAction) -> u32 {
        match action {
            MeteredAction::AiBuild => self.ai_builds_used,
            MeteredAction::AiUpgrade => self.ai_upgrades_used,
        }
    }

    /// Whether the rolling window has elapsed at `now`
    #[must_use]
    pub fn window_elapsed(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_reset_date) >= Duration::days(USAGE_WINDOW_DAYS)
    }

    fn increment(&mut self, action: MeteredAction) {
        let counter = match action {
            MeteredAction::AiBuild => &mut self.ai_builds_used,
            MeteredAction::AiUpgrade => &mut self.ai_upgrades_used,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Plan, capabilities and usage of the local install.
///
/// Fields are private: `features` is always the capability table entry for
/// `plan`, and counters only move through [`SubscriptionData::record_use`]
/// (up) and [`SubscriptionData::reset_usage`] (to zero).
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionData {
    plan: PlanTier,
    features: PlanFeatures,
    usage: UsageCounters,
    subscription_end_date: Option<DateTime<Utc>>,
    is_active: bool,
}

impl SubscriptionData {
    /// First-launch state: free plan, active, zeroed usage
    #[must_use]
    pub fn new_free(now: DateTime<Utc>) -> Self {
        Self::from_parts(PlanTier::Free, UsageCounters::fresh(now), None, true)
    }

    /// Assemble state from persisted parts, reattaching features by plan.
    #[must_use]
    pub fn from_parts(
        plan: PlanTier,
        usage: UsageCounters,
        subscription_end_date: Option<DateTime<Utc>>,
        is_active: bool,
    ) -> Self {
        Self {
            plan,
            features: PlanFeatures::for_plan(plan),
            usage,
            subscription_end_date,
            is_active,
        }
    }

    /// Current plan
    pub fn plan(&self) -> PlanTier {
        self.plan
    }

    /// Capabilities of the current plan
    pub fn features(&self) -> &PlanFeatures {
        &self.features
    }

    /// Usage counters
    pub fn usage(&self) -> &UsageCounters {
        &self.usage
    }

    /// End of the paid period, if any
    pub fn subscription_end_date(&self) -> Option<DateTime<Utc>> {
        self.subscription_end_date
    }

    /// Whether the subscription is flagged active
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether a paid period ended before `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.subscription_end_date.is_some_and(|end| end <= now)
    }

    /// Whether one more `action` fits in the plan's quota
    #[must_use]
    pub fn can_use(&self, action: MeteredAction) -> bool {
        self.features.quota(action).allows(self.usage.used(action))
    }

    /// Uses of `action` left in this window, `None` for unlimited
    #[must_use]
    pub fn remaining(&self, action: MeteredAction) -> Option<u32> {
        self.features.quota(action).remaining(self.usage.used(action))
    }

    /// Share of the `action` quota consumed, in `[0, 100]`
    #[must_use]
    pub fn usage_percentage(&self, action: MeteredAction) -> f64 {
        self.features
            .quota(action)
            .percentage_used(self.usage.used(action))
    }

    /// Count one use of `action` if the quota allows it.
    ///
    /// Returns `false` and leaves the state untouched otherwise.
    pub fn record_use(&mut self, action: MeteredAction) -> bool {
        if !self.can_use(action) {
            return false;
        }
        self.usage.increment(action);
        true
    }

    /// Switch to `plan` with a paid period of one calendar month from `now`.
    ///
    /// Usage counters carry over unchanged.
    pub fn change_plan(&mut self, plan: PlanTier, now: DateTime<Utc>) {
        self.plan = plan;
        self.features = PlanFeatures::for_plan(plan);
        self.subscription_end_date = Some(
            now.checked_add_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        self.is_active = true;
    }

    /// Zero both counters and start a new window at `now`
    pub fn reset_usage(&mut self, now: DateTime<Utc>) {
        self.usage = UsageCounters::fresh(now);
    }

    /// Reset usage if the rolling window elapsed. Returns whether it did.
    pub fn roll_over_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.usage.window_elapsed(now) {
            self.reset_usage(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn free_plan_allows_two_builds() {
        let mut data = SubscriptionData::new_free(t0());
        let results: Vec<bool> = (0..3)
            .map(|_| data.record_use(MeteredAction::AiBuild))
            .collect();
        assert_eq!(results, vec![true, true, false]);
        assert_eq!(data.usage().ai_builds_used, 2);
        assert_eq!(data.usage_percentage(MeteredAction::AiBuild), 100.0);
        assert_eq!(data.remaining(MeteredAction::AiBuild), Some(0));
    }

    #[test]
    fn change_plan_keeps_usage_and_sets_end_date() {
        let mut data = SubscriptionData::new_free(t0());
        data.record_use(MeteredAction::AiBuild);
        data.record_use(MeteredAction::AiUpgrade);
        let before = *data.usage();

        data.change_plan(PlanTier::Pro, t0());

        assert_eq!(*data.usage(), before);
        assert_eq!(*data.features(), PlanFeatures::for_plan(PlanTier::Pro));
        // Jan 31 + 1 month clamps to the end of February
        assert_eq!(
            data.subscription_end_date(),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
        assert!(data.is_active());
    }

    #[test]
    fn window_elapses_after_thirty_days() {
        let mut data = SubscriptionData::new_free(t0());
        data.record_use(MeteredAction::AiBuild);

        assert!(!data.roll_over_if_due(t0() + Duration::days(29)));
        assert_eq!(data.usage().ai_builds_used, 1);

        let later = t0() + Duration::days(30);
        assert!(data.roll_over_if_due(later));
        assert_eq!(*data.usage(), UsageCounters::fresh(later));
    }

    #[test]
    fn unlimited_plan_reports_zero_percentage() {
        let mut data = SubscriptionData::new_free(t0());
        data.change_plan(PlanTier::Premium, t0());
        for _ in 0..100 {
            assert!(data.record_use(MeteredAction::AiUpgrade));
        }
        assert_eq!(data.usage_percentage(MeteredAction::AiUpgrade), 0.0);
        assert_eq!(data.remaining(MeteredAction::AiUpgrade), None);
    }

    #[test]
    fn expiry_check() {
        let mut data = SubscriptionData::new_free(t0());
        assert!(!data.is_expired_at(t0() + Duration::days(365)));
        data.change_plan(PlanTier::Basic, t0());
        assert!(!data.is_expired_at(t0() + Duration::days(10)));
        assert!(data.is_expired_at(t0() + Duration::days(40)));
    }
}
