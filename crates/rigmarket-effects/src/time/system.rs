//! Wall-clock time handler for production use

use async_trait::async_trait;
use rigmarket_core::effects::{PhysicalTimeEffects, TimeError};
use rigmarket_core::PhysicalTime;
use std::time::{SystemTime, UNIX_EPOCH};

/// Reads the operating system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClockHandler;

impl SystemClockHandler {
    /// Create a new system clock handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for SystemClockHandler {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TimeError::OperationFailed {
                reason: format!("system clock before Unix epoch: {e}"),
            })?;
        let ts_ms = u64::try_from(elapsed.as_millis()).map_err(|_| TimeError::OperationFailed {
            reason: "system clock out of range".to_string(),
        })?;
        Ok(PhysicalTime::from_millis(ts_ms))
    }
}
