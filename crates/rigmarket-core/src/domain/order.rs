//! Orders and wishlist entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;
use crate::identifiers::{OrderId, ProductId, UserId, WishlistItemId};

/// Order lifecycle as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting payment
    Pending,
    /// Paid, awaiting shipment
    Paid,
    /// Handed to the carrier
    Shipped,
    /// Received by the buyer
    Delivered,
    /// Cancelled by either party
    Cancelled,
}

impl OrderStatus {
    /// Whether the order can no longer change
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// A purchase of one listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Buyer
    pub buyer_id: UserId,
    /// Seller
    pub seller_id: UserId,
    /// Purchased listing
    pub product_id: ProductId,
    /// Amount charged in cents
    pub amount_cents: u64,
    /// Current status
    pub status: OrderStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A saved listing on a user's wishlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Entry identifier
    pub id: WishlistItemId,
    /// Owner of the wishlist
    pub user_id: UserId,
    /// The saved listing, joined by the backend
    pub product: Product,
    /// When the listing was saved
    pub added_at: DateTime<Utc>,
}
