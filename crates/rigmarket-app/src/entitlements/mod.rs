//! # Entitlements
//!
//! Plan tiers, monthly quotas for metered AI actions, and the store that
//! tracks and persists local usage.
//!
//! ```rust,ignore
//! let store = EntitlementStore::load(storage, clock).await?;
//! if store.consume(MeteredAction::AiBuild).await {
//!     // run the build
//! }
//! ```

mod persistence;
mod plans;
mod store;
mod subscription;

use rigmarket_core::effects::{StorageError, TimeError};

pub use persistence::{SUBSCRIPTION_KEY, USAGE_KEY};
pub use plans::{MeteredAction, PlanFeatures, PlanTier, Quota};
pub use store::EntitlementStore;
pub use subscription::{SubscriptionData, UsageCounters, USAGE_WINDOW_DAYS};

/// Failures loading or mutating entitlement state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntitlementError {
    /// A persisted record exists but does not decode
    #[error("corrupt record `{key}`: {reason}")]
    CorruptRecord {
        /// Storage key of the record
        key: &'static str,
        /// Decoder message
        reason: String,
    },
    /// The storage backend failed to read a record
    #[error("reading `{key}` failed: {source}")]
    Storage {
        /// Storage key being read
        key: &'static str,
        /// Underlying storage failure
        #[source]
        source: StorageError,
    },
    /// The clock could not be read
    #[error("clock unavailable: {0}")]
    Clock(#[from] TimeError),
}
