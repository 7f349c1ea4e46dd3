//! Wishlist Workflow - saving and removing listings
//!
//! Both calls go straight to the backend. Wishlist queries keep their own
//! cache; refetch them afterwards.

use rigmarket_core::domain::WishlistItem;
use rigmarket_core::effects::MarketplaceEffects;
use rigmarket_core::{ProductId, UserId};

use crate::errors::AppResult;

/// Save `product` to `user`'s wishlist
pub async fn add_to_wishlist(
    marketplace: &dyn MarketplaceEffects,
    user: UserId,
    product: ProductId,
) -> AppResult<WishlistItem> {
    let item = marketplace.add_to_wishlist(&user, &product).await?;
    tracing::debug!(%user, %product, "added to wishlist");
    Ok(item)
}

/// Remove `product` from `user`'s wishlist. Returns whether it was saved.
pub async fn remove_from_wishlist(
    marketplace: &dyn MarketplaceEffects,
    user: UserId,
    product: ProductId,
) -> AppResult<bool> {
    let removed = marketplace.remove_from_wishlist(&user, &product).await?;
    tracing::debug!(%user, %product, removed, "removed from wishlist");
    Ok(removed)
}
