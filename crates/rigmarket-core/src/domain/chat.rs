//! Buyer/seller chats and their messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{ChatId, MessageId, ProductId, UserId};

/// A conversation between a buyer and a seller about one listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat identifier
    pub id: ChatId,
    /// Listing the chat is about
    pub product_id: ProductId,
    /// Buyer participant
    pub buyer_id: UserId,
    /// Seller participant
    pub seller_id: UserId,
    /// Preview of the newest message
    pub last_message: Option<String>,
    /// Time of the newest activity
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// The other participant from `user`'s point of view.
    ///
    /// Returns `None` when `user` is not part of this chat.
    pub fn counterpart(&self, user: &UserId) -> Option<UserId> {
        if *user == self.buyer_id {
            Some(self.seller_id)
        } else if *user == self.seller_id {
            Some(self.buyer_id)
        } else {
            None
        }
    }

    /// Whether `user` participates in this chat
    pub fn has_participant(&self, user: &UserId) -> bool {
        self.counterpart(user).is_some()
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier
    pub id: MessageId,
    /// Chat the message belongs to
    pub chat_id: ChatId,
    /// Author
    pub sender_id: UserId,
    /// Text content
    pub content: String,
    /// Server timestamp
    pub created_at: DateTime<Utc>,
}
