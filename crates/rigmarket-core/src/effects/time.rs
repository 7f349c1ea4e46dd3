//! Wall-clock time
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `rigmarket-effects` (system clock, simulated clock)
//! - **Usage**: usage-window rollover, subscription end dates, reset stamps

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::time::PhysicalTime;

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    #[error("Time service unavailable")]
    ServiceUnavailable,
    #[error("Operation failed: {reason}")]
    OperationFailed { reason: String },
}

#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current wall-clock time.
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError>;
}

#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for std::sync::Arc<T> {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        (**self).physical_time().await
    }
}
