//! # rigmarket App - Portable Headless Application Core
//!
//! Business logic of the rigmarket hardware marketplace, shared by every
//! frontend. Screens, navigation and styling live in the frontends; this
//! crate owns the state they render.
//!
//! ## Layout
//!
//! - `entitlements`: plan tiers, monthly AI quotas, persisted usage
//! - `queries`: data hooks and the realtime message feed
//! - `review`: when to ask a user to review a chat partner
//! - `workflows`: sign-in, messaging, wishlist and review mutations
//! - `config`: TOML + environment configuration
//! - `errors`: categorized errors for frontend alerts
//!
//! ## Usage
//!
//! ```rust,ignore
//! let core = AppCore::bootstrap(config, effects).await?;
//!
//! let products = core.queries().products(ProductFilters::default()).await;
//! let mut watcher = products.state().watch();
//!
//! if core.entitlements().consume(MeteredAction::AiBuild).await {
//!     // run the AI build
//! }
//! ```
//!
//! Services reach storage, the clock and the backend only through
//! [`AppEffects`].

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod entitlements;
pub mod errors;
pub mod queries;
pub mod review;
pub mod workflows;

pub use app::{AppCore, AppEffects};
pub use config::AppConfig;
pub use entitlements::{
    EntitlementError, EntitlementStore, MeteredAction, PlanFeatures, PlanTier, Quota,
    SubscriptionData,
};
pub use errors::{AppError, AppResult, ErrorCategory};
pub use queries::{DataQueries, FetchOutcome, LoadState, MessageFeed, Query};
pub use review::{should_prompt_review, ReviewPrompt, ReviewPromptWatcher};

// Re-export core for frontends that only depend on the app crate
pub use rigmarket_core as core;
