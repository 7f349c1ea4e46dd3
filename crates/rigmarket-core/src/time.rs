//! Physical time values
//!
//! Clock effects hand out [`PhysicalTime`] (milliseconds since the Unix
//! epoch). Services convert to `chrono` when they need calendar arithmetic
//! or RFC 3339 serialization.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock instant in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalTime {
    /// Milliseconds since the Unix epoch
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// Construct from milliseconds since the epoch
    pub const fn from_millis(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// Convert to a UTC datetime.
    ///
    /// Values beyond chrono's range clamp to `DateTime::<Utc>::MAX_UTC`.
    pub fn to_utc(self) -> DateTime<Utc> {
        i64::try_from(self.ts_ms)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Convert from a UTC datetime; instants before the epoch clamp to 0.
    pub fn from_utc(at: DateTime<Utc>) -> Self {
        Self {
            ts_ms: u64::try_from(at.timestamp_millis()).unwrap_or(0),
        }
    }
}

impl From<DateTime<Utc>> for PhysicalTime {
    fn from(at: DateTime<Utc>) -> Self {
        Self::from_utc(at)
    }
}
