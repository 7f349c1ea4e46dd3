//! rigmarket Core - shared foundation for the marketplace app core
//!
//! This crate holds the pieces every other layer agrees on. It contains no
//! handlers and no application logic.
//!
//! ## Layout
//! - `identifiers`: backend-assigned record identifiers
//! - `domain`: product, order, wishlist, chat, user and review records
//! - `effects`: interfaces for storage, time, auth, marketplace data and realtime push
//! - `reactive`: [`Binding<T>`], the observable value frontends read and await
//! - `errors`: the unified [`MarketError`]
//!
//! Implementations of the effect traits live in `rigmarket-effects` (storage,
//! clocks) and `rigmarket-testkit` (in-memory backend).

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Record identifiers
pub mod identifiers;

/// Physical time values produced by clock effects
pub mod time;

/// Marketplace domain records
pub mod domain;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Observable values for frontends
pub mod reactive;

pub use errors::{MarketError, Result};
pub use identifiers::{ChatId, MessageId, OrderId, ProductId, ReviewId, UserId, WishlistItemId};
pub use reactive::Binding;
pub use time::PhysicalTime;
