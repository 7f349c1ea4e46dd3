//! Identifiers for backend records
//!
//! The backend assigns UUIDs to every record. Each record kind gets its own
//! newtype so a chat id can never be passed where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Deterministic identifier for fixtures and simulations
            pub fn from_seed(seed: u8) -> Self {
                Self(Uuid::from_bytes([seed; 16]))
            }

            /// Get the inner UUID
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::MarketError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    crate::MarketError::invalid(format!(
                        "invalid {}: {e}",
                        stringify!($name)
                    ))
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

record_id!(
    /// Identifier of a registered user (buyer or seller)
    UserId
);
record_id!(
    /// Identifier of a product listing
    ProductId
);
record_id!(
    /// Identifier of an order
    OrderId
);
record_id!(
    /// Identifier of a wishlist entry
    WishlistItemId
);
record_id!(
    /// Identifier of a buyer/seller chat
    ChatId
);
record_id!(
    /// Identifier of a chat message
    MessageId
);
record_id!(
    /// Identifier of a review
    ReviewId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_plain_uuid() {
        let id = ChatId::from_seed(7);
        assert_eq!(id.to_string(), id.uuid().to_string());
    }

    #[test]
    fn test_parse_round_trips_display() {
        let id = ProductId::new_random();
        let parsed: ProductId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<UserId>().unwrap_err();
        assert!(err.message().contains("UserId"));
    }

    #[test]
    fn test_serializes_transparently() {
        let id = MessageId::from_seed(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.uuid()));
    }
}
