//! Marketplace records as the backend delivers them
//!
//! The app core treats these as opaque data apart from the few helpers
//! defined here (filter matching, chat counterpart lookup).

mod chat;
mod order;
mod product;
mod review;
mod user;

pub use chat::{Chat, ChatMessage};
pub use order::{Order, OrderStatus, WishlistItem};
pub use product::{PartCategory, PartCondition, Product, ProductFilters};
pub use review::{Review, ReviewDraft, REVIEW_RATING_RANGE};
pub use user::{Session, UserProfile};
