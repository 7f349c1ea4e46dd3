//! Product listings and listing filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{ProductId, UserId};

/// Hardware category of a listed part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    /// Processors
    Cpu,
    /// Graphics cards
    Gpu,
    /// Motherboards
    Motherboard,
    /// Memory modules
    Ram,
    /// SSDs and hard drives
    Storage,
    /// Power supplies
    Psu,
    /// Cases
    Case,
    /// Coolers and fans
    Cooling,
    /// Monitors, keyboards and the rest
    Peripheral,
}

/// Physical condition of a listed part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCondition {
    /// Sealed, never used
    New,
    /// Opened but unused or barely used
    LikeNew,
    /// Used, fully working
    Used,
    /// Sold for parts or repair
    ForParts,
}

/// A product listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Listing identifier
    pub id: ProductId,
    /// Seller who owns the listing
    pub seller_id: UserId,
    /// Listing title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Asking price in cents
    pub price_cents: u64,
    /// Part category
    pub category: PartCategory,
    /// Part condition
    pub condition: PartCondition,
    /// Image URLs, first one is the cover
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Listing creation time
    pub created_at: DateTime<Utc>,
}

/// Filters for the product list.
///
/// Every field is optional; an empty filter matches everything. Two filters
/// compare equal when every field is equal, which is what drives refetching
/// in the product list query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFilters {
    /// Restrict to one category
    pub category: Option<PartCategory>,
    /// Restrict to one condition
    pub condition: Option<PartCondition>,
    /// Inclusive lower price bound in cents
    pub min_price_cents: Option<u64>,
    /// Inclusive upper price bound in cents
    pub max_price_cents: Option<u64>,
    /// Case-insensitive substring matched against title and description
    pub search: Option<String>,
    /// Restrict to one seller
    pub seller_id: Option<UserId>,
}

impl ProductFilters {
    /// Filter on a single category
    pub fn category(category: PartCategory) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Builder: add a search term
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Builder: add an inclusive price range
    pub fn with_price_range(mut self, min_cents: Option<u64>, max_cents: Option<u64>) -> Self {
        self.min_price_cents = min_cents;
        self.max_price_cents = max_cents;
        self
    }

    /// Whether `product` passes every populated filter.
    pub fn matches(&self, product: &Product) -> bool {
        if self.category.is_some_and(|c| c != product.category) {
            return false;
        }
        if self.condition.is_some_and(|c| c != product.condition) {
            return false;
        }
        if self.seller_id.is_some_and(|s| s != product.seller_id) {
            return false;
        }
        if self.min_price_cents.is_some_and(|min| product.price_cents < min) {
            return false;
        }
        if self.max_price_cents.is_some_and(|max| product.price_cents > max) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                product.title.to_lowercase().contains(&term)
                    || product.description.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn gpu(price_cents: u64) -> Product {
        Product {
            id: ProductId::from_seed(1),
            seller_id: UserId::from_seed(2),
            title: "RTX 3080 Founders Edition".to_string(),
            description: "Never mined on".to_string(),
            price_cents,
            category: PartCategory::Gpu,
            condition: PartCondition::Used,
            image_urls: vec![],
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ProductFilters::default().matches(&gpu(40_000)));
    }

    #[test]
    fn test_category_and_condition() {
        let p = gpu(40_000);
        assert!(ProductFilters::category(PartCategory::Gpu).matches(&p));
        assert!(!ProductFilters::category(PartCategory::Cpu).matches(&p));

        let filters = ProductFilters {
            condition: Some(PartCondition::New),
            ..ProductFilters::default()
        };
        assert!(!filters.matches(&p));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let p = gpu(40_000);
        let f = ProductFilters::default().with_price_range(Some(40_000), Some(40_000));
        assert!(f.matches(&p));
        let f = ProductFilters::default().with_price_range(Some(40_001), None);
        assert!(!f.matches(&p));
        let f = ProductFilters::default().with_price_range(None, Some(39_999));
        assert!(!f.matches(&p));
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_description() {
        let p = gpu(40_000);
        assert!(ProductFilters::default().with_search("rtx").matches(&p));
        assert!(ProductFilters::default().with_search("MINED").matches(&p));
        assert!(!ProductFilters::default().with_search("radeon").matches(&p));
        assert!(ProductFilters::default().with_search("   ").matches(&p));
    }
}
