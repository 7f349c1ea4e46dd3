//! Storage records for subscription state
//!
//! Two fixed keys hold camelCase JSON with RFC 3339 timestamps. Decoding is
//! strict: anything that does not parse into the typed record is reported as
//! [`EntitlementError::CorruptRecord`].

use chrono::{DateTime, Utc};
use rigmarket_core::effects::StorageEffects;
use serde::{Deserialize, Serialize};

use super::plans::{PlanFeatures, PlanTier};
use super::subscription::{SubscriptionData, UsageCounters};
use super::EntitlementError;

/// Key of the plan record
pub const SUBSCRIPTION_KEY: &str = "subscription_data";

/// Key of the usage record
pub const USAGE_KEY: &str = "usage_data";

/// Plan record as written. `features` is informational only.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRecordOut<'a> {
    plan: PlanTier,
    features: &'a PlanFeatures,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription_end_date: Option<DateTime<Utc>>,
    is_active: bool,
}

/// Plan record as read. A persisted `features` field is ignored and the
/// capabilities are reattached from the plan name.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRecordIn {
    plan: PlanTier,
    #[serde(default)]
    subscription_end_date: Option<DateTime<Utc>>,
    is_active: bool,
}

/// Encode both records of `data`.
pub(crate) fn encode(data: &SubscriptionData) -> serde_json::Result<(Vec<u8>, Vec<u8>)> {
    let subscription = serde_json::to_vec(&SubscriptionRecordOut {
        plan: data.plan(),
        features: data.features(),
        subscription_end_date: data.subscription_end_date(),
        is_active: data.is_active(),
    })?;
    let usage = serde_json::to_vec(data.usage())?;
    Ok((subscription, usage))
}

fn decode<T: for<'de> Deserialize<'de>>(
    key: &'static str,
    bytes: &[u8],
) -> Result<T, EntitlementError> {
    serde_json::from_slice(bytes).map_err(|err| EntitlementError::CorruptRecord {
        key,
        reason: err.to_string(),
    })
}

async fn read(
    storage: &dyn StorageEffects,
    key: &'static str,
) -> Result<Option<Vec<u8>>, EntitlementError> {
    storage
        .retrieve(key)
        .await
        .map_err(|source| EntitlementError::Storage { key, source })
}

/// Read persisted state.
///
/// Returns `None` when neither record exists. A missing usage record next to
/// a present plan record starts a fresh window at `now`, and vice versa.
pub(crate) async fn read_state(
    storage: &dyn StorageEffects,
    now: DateTime<Utc>,
) -> Result<Option<SubscriptionData>, EntitlementError> {
    let subscription = read(storage, SUBSCRIPTION_KEY).await?;
    let usage = read(storage, USAGE_KEY).await?;

    if subscription.is_none() && usage.is_none() {
        return Ok(None);
    }

    let usage = match usage {
        Some(bytes) => decode::<UsageCounters>(USAGE_KEY, &bytes)?,
        None => UsageCounters::fresh(now),
    };

    let data = match subscription {
        Some(bytes) => {
            let record = decode::<SubscriptionRecordIn>(SUBSCRIPTION_KEY, &bytes)?;
            SubscriptionData::from_parts(
                record.plan,
                usage,
                record.subscription_end_date,
                record.is_active,
            )
        }
        None => SubscriptionData::from_parts(PlanTier::Free, usage, None, true),
    };

    Ok(Some(data))
}
