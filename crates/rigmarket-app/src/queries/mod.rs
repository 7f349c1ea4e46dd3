//! # Data queries
//!
//! Frontend data hooks. Each hook instance owns a [`LoadState`] binding and
//! refreshes it when its input changes. Nothing polls; screens call
//! `refetch` when they know data moved.
//!
//! - [`Query`]: generic keyed fetch with stale-result protection
//! - [`DataQueries`]: constructors for the marketplace hooks
//! - [`MessageFeed`]: chat history joined with realtime inserts

mod catalog;
mod messages;
mod query;
mod state;

pub use catalog::{
    ChatQuery, ChatsQuery, CurrentUserQuery, DataQueries, OrderQuery, OrdersQuery, ProductQuery,
    ProductsQuery, WishlistQuery,
};
pub use messages::MessageFeed;
pub use query::{FetchOutcome, Fetcher, Query};
pub use state::LoadState;
