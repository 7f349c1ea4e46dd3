//! Simulated time handler for tests and demos

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rigmarket_core::effects::{PhysicalTimeEffects, TimeError};
use rigmarket_core::PhysicalTime;
use std::sync::Arc;

/// Manually driven clock
///
/// Clones share the same current time, so a test can hold one clone and
/// advance the clock seen by a service holding another.
#[derive(Debug, Clone)]
pub struct SimulatedTimeHandler {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl SimulatedTimeHandler {
    /// Create a clock starting at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Create a clock starting at the given millisecond timestamp
    pub fn from_millis(start_ms: u64) -> Self {
        Self::new(PhysicalTime::from_millis(start_ms).to_utc())
    }

    /// Current simulated time
    pub fn now(&self) -> DateTime<Utc> {
        *self.current_time.lock()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.current_time.lock();
        *now += by;
    }

    /// Move the clock forward by whole days
    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }

    /// Jump to an absolute time
    pub fn set(&self, at: DateTime<Utc>) {
        *self.current_time.lock() = at;
    }
}

impl Default for SimulatedTimeHandler {
    fn default() -> Self {
        // 2024-01-01T00:00:00Z
        Self::from_millis(1_704_067_200_000)
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedTimeHandler {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        Ok(PhysicalTime::from_utc(self.now()))
    }
}
