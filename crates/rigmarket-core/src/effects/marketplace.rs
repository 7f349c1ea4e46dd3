//! Remote marketplace data
//!
//! CRUD-style calls against the hosted backend. Implementations map their
//! transport failures onto [`crate::MarketError`]; callers never retry.

use async_trait::async_trait;

use crate::domain::{
    Chat, ChatMessage, Order, Product, ProductFilters, Review, ReviewDraft, WishlistItem,
};
use crate::identifiers::{ChatId, OrderId, ProductId, UserId};
use crate::Result;

#[async_trait]
pub trait MarketplaceEffects: Send + Sync {
    /// Listings matching `filters`, newest first.
    async fn list_products(&self, filters: &ProductFilters) -> Result<Vec<Product>>;

    /// One listing, `None` if it does not exist.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Orders placed by `buyer`, newest first.
    async fn list_orders(&self, buyer: &UserId) -> Result<Vec<Order>>;

    /// One order, `None` if it does not exist.
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>>;

    /// `user`'s wishlist, newest first.
    async fn list_wishlist(&self, user: &UserId) -> Result<Vec<WishlistItem>>;

    /// Save a listing to `user`'s wishlist.
    async fn add_to_wishlist(&self, user: &UserId, product: &ProductId) -> Result<WishlistItem>;

    /// Remove a listing from `user`'s wishlist. Returns whether it was there.
    async fn remove_from_wishlist(&self, user: &UserId, product: &ProductId) -> Result<bool>;

    /// Chats `user` takes part in, most recently active first.
    async fn list_chats(&self, user: &UserId) -> Result<Vec<Chat>>;

    /// One chat, `None` if it does not exist.
    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>>;

    /// Messages of a chat in send order.
    async fn list_messages(&self, chat: &ChatId) -> Result<Vec<ChatMessage>>;

    /// Number of messages in a chat.
    async fn count_messages(&self, chat: &ChatId) -> Result<u64>;

    /// Post a message. The backend also pushes it over realtime.
    async fn send_message(&self, chat: &ChatId, sender: &UserId, content: &str)
        -> Result<ChatMessage>;

    /// Whether `reviewer` already reviewed the other party of `chat`.
    async fn review_exists(&self, chat: &ChatId, reviewer: &UserId) -> Result<bool>;

    /// Store a review.
    async fn submit_review(&self, draft: &ReviewDraft) -> Result<Review>;
}
