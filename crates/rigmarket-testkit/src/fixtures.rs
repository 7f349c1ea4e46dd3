//! Deterministic records for tests
//!
//! Ids come from `from_seed`, timestamps from [`base_time`] plus an offset,
//! so the same call always builds the same record.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rigmarket_core::domain::{
    Chat, ChatMessage, Order, OrderStatus, PartCategory, PartCondition, Product, Review,
    UserProfile,
};
use rigmarket_core::{ChatId, MessageId, OrderId, ProductId, ReviewId, UserId};
use uuid::Uuid;

/// 2024-01-01T00:00:00Z
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Buyer used by most fixtures
pub fn buyer() -> UserProfile {
    user(1, "gpu_hunter")
}

/// Seller used by most fixtures
pub fn seller() -> UserProfile {
    user(2, "rig_seller")
}

/// Profile with a seeded id and `<username>@rig.test` email
pub fn user(seed: u8, username: &str) -> UserProfile {
    UserProfile {
        id: UserId::from_seed(seed),
        email: format!("{username}@rig.test"),
        username: username.to_string(),
        avatar_url: None,
    }
}

/// GPU listing by [`seller`], created `seed` minutes after [`base_time`]
pub fn product(seed: u8, title: &str, price_cents: u64) -> Product {
    Product {
        id: ProductId::from_seed(seed),
        seller_id: seller().id,
        title: title.to_string(),
        description: format!("{title}, tested and working"),
        price_cents,
        category: PartCategory::Gpu,
        condition: PartCondition::Used,
        image_urls: Vec::new(),
        created_at: base_time() + Duration::minutes(i64::from(seed)),
    }
}

/// Same as [`product`] with another category
pub fn product_in(seed: u8, title: &str, price_cents: u64, category: PartCategory) -> Product {
    Product {
        category,
        ..product(seed, title, price_cents)
    }
}

/// Paid order of `product` by [`buyer`]
pub fn order(seed: u8, product: &Product) -> Order {
    Order {
        id: OrderId::from_seed(seed),
        buyer_id: buyer().id,
        seller_id: product.seller_id,
        product_id: product.id,
        amount_cents: product.price_cents,
        status: OrderStatus::Paid,
        created_at: base_time() + Duration::hours(i64::from(seed)),
    }
}

/// Chat between [`buyer`] and [`seller`] about listing `seed`
pub fn chat(seed: u8) -> Chat {
    Chat {
        id: ChatId::from_seed(seed),
        product_id: ProductId::from_seed(seed),
        buyer_id: buyer().id,
        seller_id: seller().id,
        last_message: None,
        updated_at: base_time(),
    }
}

/// Message number `n` in `chat`, alternating buyer and seller
pub fn message(chat: &Chat, n: u32) -> ChatMessage {
    let sender = if n % 2 == 0 {
        chat.buyer_id
    } else {
        chat.seller_id
    };
    ChatMessage {
        id: MessageId::from_uuid(message_uuid(chat.id, n)),
        chat_id: chat.id,
        sender_id: sender,
        content: format!("message {n}"),
        created_at: base_time() + Duration::seconds(i64::from(n)),
    }
}

/// `count` consecutive messages in `chat`
pub fn conversation(chat: &Chat, count: u32) -> Vec<ChatMessage> {
    (0..count).map(|n| message(chat, n)).collect()
}

/// Review of [`seller`] by [`buyer`] in `chat`
pub fn review(chat: &Chat, rating: u8) -> Review {
    Review {
        id: ReviewId::from_seed(chat.id.uuid().as_bytes()[0]),
        chat_id: chat.id,
        reviewer_id: chat.buyer_id,
        reviewee_id: chat.seller_id,
        rating,
        comment: None,
        created_at: base_time(),
    }
}

fn message_uuid(chat: ChatId, n: u32) -> Uuid {
    let mut bytes = *chat.uuid().as_bytes();
    bytes[12..16].copy_from_slice(&n.to_be_bytes());
    Uuid::from_bytes(bytes)
}
