//! Plan tiers and the static capability table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Subscription tier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Default tier for every new install
    #[default]
    Free,
    /// Entry paid tier
    Basic,
    /// Power-user tier
    Pro,
    /// Unlimited tier
    Premium,
}

impl PlanTier {
    /// Every tier, cheapest first
    pub const ALL: [PlanTier; 4] = [Self::Free, Self::Basic, Self::Pro, Self::Premium];

    /// Lowercase name used in storage and on the command line
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Premium => "premium",
        }
    }

    /// Capability table entry for this tier
    #[must_use]
    pub fn features(&self) -> PlanFeatures {
        PlanFeatures::for_plan(*self)
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "premium" => Ok(Self::Premium),
            other => Err(AppError::input(format!("unknown plan: {other}"))),
        }
    }
}

/// A metered action counted against the monthly quota
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeteredAction {
    /// Generate a new AI build recommendation
    #[serde(rename = "new")]
    AiBuild,
    /// Generate an AI upgrade recommendation for an existing build
    #[serde(rename = "upgrade")]
    AiUpgrade,
}

impl MeteredAction {
    /// Name used in logs and on the command line
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiBuild => "new",
            Self::AiUpgrade => "upgrade",
        }
    }
}

impl fmt::Display for MeteredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeteredAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" | "build" => Ok(Self::AiBuild),
            "upgrade" => Ok(Self::AiUpgrade),
            other => Err(AppError::input(format!("unknown action: {other}"))),
        }
    }
}

/// Monthly allowance for a metered action.
///
/// Stored as an integer where `-1` means unlimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Quota {
    /// At most this many uses per window
    Limited(u32),
    /// No cap
    Unlimited,
}

impl Quota {
    /// Wire value meaning "unlimited"
    pub const UNLIMITED_SENTINEL: i64 = -1;

    /// Whether `used` still leaves room for one more use
    #[must_use]
    pub fn allows(&self, used: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(limit) => used < *limit,
        }
    }

    /// Uses left, `None` for unlimited
    #[must_use]
    pub fn remaining(&self, used: u32) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Limited(limit) => Some(limit.saturating_sub(used)),
        }
    }

    /// Share of the quota consumed, in `[0, 100]`
    #[must_use]
    pub fn percentage_used(&self, used: u32) -> f64 {
        match self {
            Self::Unlimited => 0.0,
            Self::Limited(0) => 100.0,
            Self::Limited(limit) => (f64::from(used) / f64::from(*limit) * 100.0).min(100.0),
        }
    }
}

impl TryFrom<i64> for Quota {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == Self::UNLIMITED_SENTINEL {
            return Ok(Self::Unlimited);
        }
        u32::try_from(value)
            .map(Self::Limited)
            .map_err(|_| format!("invalid quota {value}: expected -1 or a non-negative count"))
    }
}

impl From<Quota> for i64 {
    fn from(quota: Quota) -> Self {
        match quota {
            Quota::Unlimited => Quota::UNLIMITED_SENTINEL,
            Quota::Limited(limit) => i64::from(limit),
        }
    }
}

/// Capabilities granted by a plan.
///
/// Values only ever come from [`PlanFeatures::for_plan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFeatures {
    /// AI build recommendations per window
    pub ai_builds_per_month: Quota,
    /// AI upgrade recommendations per window
    pub ai_upgrades_per_month: Quota,
    /// Price-drop alerts on wishlist items
    pub price_alerts: bool,
    /// Support queue priority
    pub priority_support: bool,
    /// No promoted listings in feeds
    pub ad_free: bool,
    /// Listing performance analytics for sellers
    pub seller_analytics: bool,
}

impl PlanFeatures {
    /// Capability table entry for `plan`.
    ///
    /// | Plan | Builds | Upgrades | Alerts | Priority | Ad free | Analytics |
    /// |------|--------|----------|--------|----------|---------|-----------|
    /// | free | 2 | 1 | no | no | no | no |
    /// | basic | 10 | 5 | yes | no | yes | no |
    /// | pro | 30 | 15 | yes | yes | yes | yes |
    /// | premium | unlimited | unlimited | yes | yes | yes | yes |
    #[must_use]
    pub const fn for_plan(plan: PlanTier) -> Self {
        match plan {
            PlanTier::Free => Self {
                ai_builds_per_month: Quota::Limited(2),
                ai_upgrades_per_month: Quota::Limited(1),
                price_alerts: false,
                priority_support: false,
                ad_free: false,
                seller_analytics: false,
            },
            PlanTier::Basic => Self {
                ai_builds_per_month: Quota::Limited(10),
                ai_upgrades_per_month: Quota::Limited(5),
                price_alerts: true,
                priority_support: false,
                ad_free: true,
                seller_analytics: false,
            },
            PlanTier::Pro => Self {
                ai_builds_per_month: Quota::Limited(30),
                ai_upgrades_per_month: Quota::Limited(15),
                price_alerts: true,
                priority_support: true,
                ad_free: true,
                seller_analytics: true,
            },
            PlanTier::Premium => Self {
                ai_builds_per_month: Quota::Unlimited,
                ai_upgrades_per_month: Quota::Unlimited,
                price_alerts: true,
                priority_support: true,
                ad_free: true,
                seller_analytics: true,
            },
        }
    }

    /// Quota governing `action`
    #[must_use]
    pub fn quota(&self, action: MeteredAction) -> Quota {
        match action {
            MeteredAction::AiBuild => self.ai_builds_per_month,
            MeteredAction::AiUpgrade => self.ai_upgrades_per_month,
        }
    }
}
