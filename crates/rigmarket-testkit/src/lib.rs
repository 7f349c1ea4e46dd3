//! rigmarket Testing Infrastructure
//!
//! In-memory stand-ins for every effect the app core consumes, plus
//! deterministic fixtures.
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! rigmarket-testkit = { path = "../rigmarket-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,ignore
//! use rigmarket_testkit::*;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let backend = InMemoryMarketplace::new();
//!     backend.seed_product(fixtures::product(1, "RTX 3080", 45_000));
//!     // ... test logic
//! }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod backend;
pub mod fixtures;

pub use backend::{ops, Gate, InMemoryMarketplace};

// Storage and clock handlers tests usually pair with the backend
pub use rigmarket_effects::{MemoryStorageHandler, SimulatedTimeHandler};
