//! Effect interfaces
//!
//! Every external capability the app core touches is expressed as a trait
//! here and injected into services at construction time:
//!
//! - **Infrastructure effects** (`StorageEffects`, `PhysicalTimeEffects`):
//!   implemented by `rigmarket-effects`.
//! - **Backend effects** (`AuthEffects`, `MarketplaceEffects`,
//!   `RealtimeEffects`): implemented by the backend client of the host app,
//!   and in-memory by `rigmarket-testkit`.
//!
//! Services never reach for ambient globals; a store or query owns exactly
//! the effect handles it was built with.

pub mod auth;
pub mod marketplace;
pub mod realtime;
pub mod storage;
pub mod time;

pub use auth::AuthEffects;
pub use marketplace::MarketplaceEffects;
pub use realtime::{MessageStream, RealtimeEffects};
pub use storage::{StorageEffects, StorageError};
pub use time::{PhysicalTimeEffects, TimeError};
