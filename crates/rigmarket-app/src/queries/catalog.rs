//! Data hooks over the marketplace backend
//!
//! Each constructor builds a fresh [`Query`], points it at its first input
//! and waits for the first settle. Instances do not share caches; call
//! [`Query::refetch`] after a mutation to pick up the change.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rigmarket_core::domain::{Chat, Order, Product, ProductFilters, UserProfile, WishlistItem};
use rigmarket_core::effects::{AuthEffects, MarketplaceEffects, RealtimeEffects};
use rigmarket_core::{ChatId, OrderId, ProductId, UserId};

use super::messages::MessageFeed;
use super::query::{Fetcher, Query};

/// Product list filtered by [`ProductFilters`]
pub type ProductsQuery = Query<ProductFilters, Vec<Product>>;
/// Single product
pub type ProductQuery = Query<ProductId, Option<Product>>;
/// Orders of a buyer
pub type OrdersQuery = Query<UserId, Vec<Order>>;
/// Single order
pub type OrderQuery = Query<OrderId, Option<Order>>;
/// Wishlist of a user
pub type WishlistQuery = Query<UserId, Vec<WishlistItem>>;
/// Chats of a user
pub type ChatsQuery = Query<UserId, Vec<Chat>>;
/// Single chat
pub type ChatQuery = Query<ChatId, Option<Chat>>;
/// Profile of the signed-in user
pub type CurrentUserQuery = Query<(), Option<UserProfile>>;

/// Factory for data hooks sharing one set of backend handles
#[derive(Clone)]
pub struct DataQueries {
    marketplace: Arc<dyn MarketplaceEffects>,
    auth: Arc<dyn AuthEffects>,
    realtime: Arc<dyn RealtimeEffects>,
    timeout: Duration,
}

impl DataQueries {
    /// Build a factory. `timeout` bounds every fetch.
    pub fn new(
        marketplace: Arc<dyn MarketplaceEffects>,
        auth: Arc<dyn AuthEffects>,
        realtime: Arc<dyn RealtimeEffects>,
        timeout: Duration,
    ) -> Self {
        Self {
            marketplace,
            auth,
            realtime,
            timeout,
        }
    }

    /// Timeout applied to each fetch
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn start<K, T>(&self, query: Query<K, T>, input: Option<K>) -> Query<K, T>
    where
        K: Clone + PartialEq + Send + Sync + 'static,
        T: Clone + Default + Send + Sync + 'static,
    {
        query.set_input(input).await;
        query
    }

    /// Listings matching `filters`
    pub async fn products(&self, filters: ProductFilters) -> ProductsQuery {
        let marketplace = self.marketplace.clone();
        let fetcher: Fetcher<ProductFilters, Vec<Product>> = Arc::new(move |filters| {
            let marketplace = marketplace.clone();
            async move { marketplace.list_products(&filters).await }.boxed()
        });
        self.start(Query::new("products", self.timeout, fetcher), Some(filters))
            .await
    }

    /// One listing
    pub async fn product(&self, id: Option<ProductId>) -> ProductQuery {
        let marketplace = self.marketplace.clone();
        let fetcher: Fetcher<ProductId, Option<Product>> = Arc::new(move |id| {
            let marketplace = marketplace.clone();
            async move { marketplace.get_product(&id).await }.boxed()
        });
        self.start(Query::new("product", self.timeout, fetcher), id).await
    }

    /// Orders placed by `buyer`
    pub async fn orders(&self, buyer: Option<UserId>) -> OrdersQuery {
        let marketplace = self.marketplace.clone();
        let fetcher: Fetcher<UserId, Vec<Order>> = Arc::new(move |buyer| {
            let marketplace = marketplace.clone();
            async move { marketplace.list_orders(&buyer).await }.boxed()
        });
        self.start(Query::new("orders", self.timeout, fetcher), buyer)
            .await
    }

    /// One order
    pub async fn order(&self, id: Option<OrderId>) -> OrderQuery {
        let marketplace = self.marketplace.clone();
        let fetcher: Fetcher<OrderId, Option<Order>> = Arc::new(move |id| {
            let marketplace = marketplace.clone();
            async move { marketplace.get_order(&id).await }.boxed()
        });
        self.start(Query::new("order", self.timeout, fetcher), id).await
    }

    /// Wishlist of `user`
    pub async fn wishlist(&self, user: Option<UserId>) -> WishlistQuery {
        let marketplace = self.marketplace.clone();
        let fetcher: Fetcher<UserId, Vec<WishlistItem>> = Arc::new(move |user| {
            let marketplace = marketplace.clone();
            async move { marketplace.list_wishlist(&user).await }.boxed()
        });
        self.start(Query::new("wishlist", self.timeout, fetcher), user)
            .await
    }

    /// Chats `user` takes part in
    pub async fn chats(&self, user: Option<UserId>) -> ChatsQuery {
        let marketplace = self.marketplace.clone();
        let fetcher: Fetcher<UserId, Vec<Chat>> = Arc::new(move |user| {
            let marketplace = marketplace.clone();
            async move { marketplace.list_chats(&user).await }.boxed()
        });
        self.start(Query::new("chats", self.timeout, fetcher), user)
            .await
    }

    /// One chat
    pub async fn chat(&self, id: Option<ChatId>) -> ChatQuery {
        let marketplace = self.marketplace.clone();
        let fetcher: Fetcher<ChatId, Option<Chat>> = Arc::new(move |id| {
            let marketplace = marketplace.clone();
            async move { marketplace.get_chat(&id).await }.boxed()
        });
        self.start(Query::new("chat", self.timeout, fetcher), id).await
    }

    /// Profile of the signed-in user, `None` when signed out
    pub async fn current_user(&self) -> CurrentUserQuery {
        let auth = self.auth.clone();
        let fetcher: Fetcher<(), Option<UserProfile>> = Arc::new(move |()| {
            let auth = auth.clone();
            async move { auth.current_user().await }.boxed()
        });
        self.start(Query::new("current_user", self.timeout, fetcher), Some(()))
            .await
    }

    /// Live message list for `chat`
    pub async fn messages(&self, chat: Option<ChatId>) -> MessageFeed {
        let feed = MessageFeed::new(self.marketplace.clone(), self.realtime.clone(), self.timeout);
        feed.set_chat(chat).await;
        feed
    }
}

impl std::fmt::Debug for DataQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataQueries")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
