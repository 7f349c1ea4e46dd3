//! In-memory marketplace backend
//!
//! [`InMemoryMarketplace`] implements every backend effect trait over plain
//! vectors. Tests seed it, then control it per operation:
//!
//! - call counts ([`InMemoryMarketplace::calls`])
//! - injected failures ([`InMemoryMarketplace::fail`])
//! - gated responses that block until released ([`InMemoryMarketplace::gate_next`])
//!
//! Realtime inserts go through one broadcast hub shared by all chats, so
//! subscribers see events for every chat and must filter.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::Mutex;
use rigmarket_core::domain::{
    Chat, ChatMessage, Order, Product, ProductFilters, Review, ReviewDraft, Session, UserProfile,
    WishlistItem,
};
use rigmarket_core::effects::{
    AuthEffects, MarketplaceEffects, MessageStream, RealtimeEffects,
};
use rigmarket_core::{
    ChatId, MarketError, MessageId, OrderId, ProductId, Result, ReviewId, UserId, WishlistItemId,
};
use tokio::sync::{broadcast, Semaphore};
use tokio_stream::wrappers::BroadcastStream;

/// Operation names used for call counting, failures and gates
#[allow(missing_docs)]
pub mod ops {
    pub const LIST_PRODUCTS: &str = "list_products";
    pub const GET_PRODUCT: &str = "get_product";
    pub const LIST_ORDERS: &str = "list_orders";
    pub const GET_ORDER: &str = "get_order";
    pub const LIST_WISHLIST: &str = "list_wishlist";
    pub const ADD_TO_WISHLIST: &str = "add_to_wishlist";
    pub const REMOVE_FROM_WISHLIST: &str = "remove_from_wishlist";
    pub const LIST_CHATS: &str = "list_chats";
    pub const GET_CHAT: &str = "get_chat";
    pub const LIST_MESSAGES: &str = "list_messages";
    pub const COUNT_MESSAGES: &str = "count_messages";
    pub const SEND_MESSAGE: &str = "send_message";
    pub const REVIEW_EXISTS: &str = "review_exists";
    pub const SUBMIT_REVIEW: &str = "submit_review";
    pub const SUBSCRIBE_MESSAGES: &str = "subscribe_messages";
    pub const SIGN_IN: &str = "sign_in";
    pub const SIGN_UP: &str = "sign_up";
    pub const SIGN_IN_WITH_GOOGLE: &str = "sign_in_with_google";
    pub const SIGN_IN_WITH_APPLE: &str = "sign_in_with_apple";
    pub const SIGN_OUT: &str = "sign_out";
    pub const CURRENT_USER: &str = "current_user";
}

const HUB_CAPACITY: usize = 256;

/// Holds one backend call until released
#[derive(Clone, Debug)]
pub struct Gate {
    permits: Arc<Semaphore>,
}

impl Gate {
    fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Let the held call continue
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    async fn wait(&self) {
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

#[derive(Default)]
struct Records {
    products: Vec<Product>,
    orders: Vec<Order>,
    wishlist: Vec<WishlistItem>,
    chats: Vec<Chat>,
    messages: Vec<ChatMessage>,
    reviews: Vec<Review>,
    accounts: Vec<(UserProfile, String)>,
    oauth_user: Option<UserProfile>,
    session: Option<Session>,
}

struct Inner {
    records: Mutex<Records>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, MarketError>>,
    gates: Mutex<HashMap<&'static str, VecDeque<Gate>>>,
    hub: broadcast::Sender<ChatMessage>,
    live_subscriptions: Arc<AtomicUsize>,
}

/// In-memory backend implementing auth, marketplace and realtime effects.
///
/// Clones share state.
#[derive(Clone)]
pub struct InMemoryMarketplace {
    inner: Arc<Inner>,
}

impl Default for InMemoryMarketplace {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMarketplace {
    /// Empty backend
    pub fn new() -> Self {
        let (hub, _) = broadcast::channel(HUB_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                records: Mutex::new(Records::default()),
                calls: Mutex::new(HashMap::new()),
                failures: Mutex::new(HashMap::new()),
                gates: Mutex::new(HashMap::new()),
                hub,
                live_subscriptions: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Add a listing
    pub fn seed_product(&self, product: Product) {
        self.inner.records.lock().products.push(product);
    }

    /// Add an order
    pub fn seed_order(&self, order: Order) {
        self.inner.records.lock().orders.push(order);
    }

    /// Add a chat
    pub fn seed_chat(&self, chat: Chat) {
        self.inner.records.lock().chats.push(chat);
    }

    /// Store a message without pushing it over realtime
    pub fn seed_message(&self, message: ChatMessage) {
        self.inner.records.lock().messages.push(message);
    }

    /// Add a review
    pub fn seed_review(&self, review: Review) {
        self.inner.records.lock().reviews.push(review);
    }

    /// Register an email/password account
    pub fn seed_account(&self, profile: UserProfile, password: impl Into<String>) {
        self.inner
            .records
            .lock()
            .accounts
            .push((profile, password.into()));
    }

    /// User returned by the Google and Apple sign-ins
    pub fn set_oauth_user(&self, profile: UserProfile) {
        self.inner.records.lock().oauth_user = Some(profile);
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    /// Make every call to `op` fail with `error` until cleared
    pub fn fail(&self, op: &'static str, error: MarketError) {
        self.inner.failures.lock().insert(op, error);
    }

    /// Stop failing `op`
    pub fn clear_failure(&self, op: &'static str) {
        self.inner.failures.lock().remove(op);
    }

    /// Hold the next call to `op` until the returned gate is released.
    ///
    /// Gates queue: the n-th call waits on the n-th gate.
    pub fn gate_next(&self, op: &'static str) -> Gate {
        let gate = Gate::new();
        self.inner
            .gates
            .lock()
            .entry(op)
            .or_default()
            .push_back(gate.clone());
        gate
    }

    /// Number of calls made to `op`
    pub fn calls(&self, op: &'static str) -> usize {
        self.inner.calls.lock().get(op).copied().unwrap_or(0)
    }

    /// Total number of backend calls
    pub fn total_calls(&self) -> usize {
        self.inner.calls.lock().values().sum()
    }

    /// Yield until `op` has been called `count` times.
    ///
    /// Pair with [`gate_next`](Self::gate_next) to know a spawned fetch has
    /// reached the backend. Panics after 1000 yields.
    pub async fn wait_for_calls(&self, op: &'static str, count: usize) {
        for _ in 0..1000 {
            if self.calls(op) >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{op} reached {} calls, expected {count}", self.calls(op));
    }

    /// Yield until exactly `count` realtime streams are open.
    pub async fn wait_for_subscriptions(&self, count: usize) {
        for _ in 0..1000 {
            if self.live_subscriptions() == count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "{} live subscriptions, expected {count}",
            self.live_subscriptions()
        );
    }

    /// Push a message insert event without storing it
    pub fn publish_message(&self, message: ChatMessage) {
        let _ = self.inner.hub.send(message);
    }

    /// Realtime streams currently open
    pub fn live_subscriptions(&self) -> usize {
        self.inner.live_subscriptions.load(Ordering::SeqCst)
    }

    /// Stored messages of `chat`
    pub fn messages_in(&self, chat: &ChatId) -> Vec<ChatMessage> {
        self.inner
            .records
            .lock()
            .messages
            .iter()
            .filter(|m| m.chat_id == *chat)
            .cloned()
            .collect()
    }

    /// Stored reviews
    pub fn reviews(&self) -> Vec<Review> {
        self.inner.records.lock().reviews.clone()
    }

    /// Session held by the fake auth provider
    pub fn session(&self) -> Option<Session> {
        self.inner.records.lock().session.clone()
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        *self.inner.calls.lock().entry(op).or_default() += 1;

        let gate = self
            .inner
            .gates
            .lock()
            .get_mut(op)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            gate.wait().await;
        }

        match self.inner.failures.lock().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn open_session(&self, user: UserProfile) -> Session {
        let session = Session {
            access_token: format!("token-{}", user.id),
            user,
        };
        self.inner.records.lock().session = Some(session.clone());
        session
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl MarketplaceEffects for InMemoryMarketplace {
    async fn list_products(&self, filters: &ProductFilters) -> Result<Vec<Product>> {
        self.enter(ops::LIST_PRODUCTS).await?;
        let mut products: Vec<Product> = self
            .inner
            .records
            .lock()
            .products
            .iter()
            .filter(|p| filters.matches(p))
            .cloned()
            .collect();
        newest_first(&mut products, |p| p.created_at);
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        self.enter(ops::GET_PRODUCT).await?;
        let records = self.inner.records.lock();
        Ok(records.products.iter().find(|p| p.id == *id).cloned())
    }

    async fn list_orders(&self, buyer: &UserId) -> Result<Vec<Order>> {
        self.enter(ops::LIST_ORDERS).await?;
        let mut orders: Vec<Order> = self
            .inner
            .records
            .lock()
            .orders
            .iter()
            .filter(|o| o.buyer_id == *buyer)
            .cloned()
            .collect();
        newest_first(&mut orders, |o| o.created_at);
        Ok(orders)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>> {
        self.enter(ops::GET_ORDER).await?;
        let records = self.inner.records.lock();
        Ok(records.orders.iter().find(|o| o.id == *id).cloned())
    }

    async fn list_wishlist(&self, user: &UserId) -> Result<Vec<WishlistItem>> {
        self.enter(ops::LIST_WISHLIST).await?;
        let mut items: Vec<WishlistItem> = self
            .inner
            .records
            .lock()
            .wishlist
            .iter()
            .filter(|w| w.user_id == *user)
            .cloned()
            .collect();
        newest_first(&mut items, |w| w.added_at);
        Ok(items)
    }

    async fn add_to_wishlist(&self, user: &UserId, product: &ProductId) -> Result<WishlistItem> {
        self.enter(ops::ADD_TO_WISHLIST).await?;
        let mut records = self.inner.records.lock();
        if let Some(existing) = records
            .wishlist
            .iter()
            .find(|w| w.user_id == *user && w.product.id == *product)
        {
            return Ok(existing.clone());
        }
        let listing = records
            .products
            .iter()
            .find(|p| p.id == *product)
            .cloned()
            .ok_or_else(|| MarketError::not_found(format!("product {product}")))?;
        let item = WishlistItem {
            id: WishlistItemId::new_random(),
            user_id: *user,
            product: listing,
            added_at: Utc::now(),
        };
        records.wishlist.push(item.clone());
        Ok(item)
    }

    async fn remove_from_wishlist(&self, user: &UserId, product: &ProductId) -> Result<bool> {
        self.enter(ops::REMOVE_FROM_WISHLIST).await?;
        let mut records = self.inner.records.lock();
        let before = records.wishlist.len();
        records
            .wishlist
            .retain(|w| !(w.user_id == *user && w.product.id == *product));
        Ok(records.wishlist.len() != before)
    }

    async fn list_chats(&self, user: &UserId) -> Result<Vec<Chat>> {
        self.enter(ops::LIST_CHATS).await?;
        let mut chats: Vec<Chat> = self
            .inner
            .records
            .lock()
            .chats
            .iter()
            .filter(|c| c.has_participant(user))
            .cloned()
            .collect();
        newest_first(&mut chats, |c| c.updated_at);
        Ok(chats)
    }

    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>> {
        self.enter(ops::GET_CHAT).await?;
        let records = self.inner.records.lock();
        Ok(records.chats.iter().find(|c| c.id == *id).cloned())
    }

    async fn list_messages(&self, chat: &ChatId) -> Result<Vec<ChatMessage>> {
        self.enter(ops::LIST_MESSAGES).await?;
        Ok(self.messages_in(chat))
    }

    async fn count_messages(&self, chat: &ChatId) -> Result<u64> {
        self.enter(ops::COUNT_MESSAGES).await?;
        Ok(self.messages_in(chat).len() as u64)
    }

    async fn send_message(
        &self,
        chat: &ChatId,
        sender: &UserId,
        content: &str,
    ) -> Result<ChatMessage> {
        self.enter(ops::SEND_MESSAGE).await?;
        let message = {
            let mut records = self.inner.records.lock();
            let now = Utc::now();
            let thread = records
                .chats
                .iter_mut()
                .find(|c| c.id == *chat)
                .ok_or_else(|| MarketError::not_found(format!("chat {chat}")))?;
            if !thread.has_participant(sender) {
                return Err(MarketError::permission_denied(format!(
                    "user {sender} is not part of chat {chat}"
                )));
            }
            thread.last_message = Some(content.to_string());
            thread.updated_at = now;

            let message = ChatMessage {
                id: MessageId::new_random(),
                chat_id: *chat,
                sender_id: *sender,
                content: content.to_string(),
                created_at: now,
            };
            records.messages.push(message.clone());
            message
        };
        self.publish_message(message.clone());
        Ok(message)
    }

    async fn review_exists(&self, chat: &ChatId, reviewer: &UserId) -> Result<bool> {
        self.enter(ops::REVIEW_EXISTS).await?;
        let records = self.inner.records.lock();
        Ok(records
            .reviews
            .iter()
            .any(|r| r.chat_id == *chat && r.reviewer_id == *reviewer))
    }

    async fn submit_review(&self, draft: &ReviewDraft) -> Result<Review> {
        self.enter(ops::SUBMIT_REVIEW).await?;
        let review = Review {
            id: ReviewId::new_random(),
            chat_id: draft.chat_id,
            reviewer_id: draft.reviewer_id,
            reviewee_id: draft.reviewee_id,
            rating: draft.rating,
            comment: draft.comment.clone(),
            created_at: Utc::now(),
        };
        self.inner.records.lock().reviews.push(review.clone());
        Ok(review)
    }
}

/// Decrements the live subscription count when a stream is dropped
struct SubscriptionGuard(Arc<AtomicUsize>);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RealtimeEffects for InMemoryMarketplace {
    async fn subscribe_messages(&self, _chat: &ChatId) -> Result<MessageStream> {
        self.enter(ops::SUBSCRIBE_MESSAGES).await?;

        let receiver = self.inner.hub.subscribe();
        self.inner.live_subscriptions.fetch_add(1, Ordering::SeqCst);
        let guard = SubscriptionGuard(self.inner.live_subscriptions.clone());

        let stream = BroadcastStream::new(receiver).filter_map(move |event| {
            let _held = &guard;
            futures::future::ready(event.ok())
        });
        Ok(stream.boxed())
    }
}

#[async_trait]
impl AuthEffects for InMemoryMarketplace {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.enter(ops::SIGN_IN).await?;
        let user = self
            .inner
            .records
            .lock()
            .accounts
            .iter()
            .find(|(profile, secret)| profile.email == email && secret == password)
            .map(|(profile, _)| profile.clone())
            .ok_or_else(|| MarketError::auth("Invalid login credentials"))?;
        Ok(self.open_session(user))
    }

    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<Session> {
        self.enter(ops::SIGN_UP).await?;
        let user = {
            let mut records = self.inner.records.lock();
            if records.accounts.iter().any(|(p, _)| p.email == email) {
                return Err(MarketError::auth("User already registered"));
            }
            let user = UserProfile {
                id: UserId::new_random(),
                email: email.to_string(),
                username: username.to_string(),
                avatar_url: None,
            };
            records.accounts.push((user.clone(), password.to_string()));
            user
        };
        Ok(self.open_session(user))
    }

    async fn sign_in_with_google(&self) -> Result<Session> {
        self.enter(ops::SIGN_IN_WITH_GOOGLE).await?;
        let user = self.inner.records.lock().oauth_user.clone();
        let user = user.ok_or_else(|| MarketError::auth("Google sign-in was cancelled"))?;
        Ok(self.open_session(user))
    }

    async fn sign_in_with_apple(&self) -> Result<Session> {
        self.enter(ops::SIGN_IN_WITH_APPLE).await?;
        let user = self.inner.records.lock().oauth_user.clone();
        let user = user.ok_or_else(|| MarketError::auth("Apple sign-in was cancelled"))?;
        Ok(self.open_session(user))
    }

    async fn sign_out(&self) -> Result<()> {
        self.enter(ops::SIGN_OUT).await?;
        self.inner.records.lock().session = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<UserProfile>> {
        self.enter(ops::CURRENT_USER).await?;
        let records = self.inner.records.lock();
        Ok(records.session.as_ref().map(|s| s.user.clone()))
    }
}
