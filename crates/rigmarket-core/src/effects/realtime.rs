//! Realtime push channel
//!
//! The backend delivers message insert events per chat. A subscription is a
//! stream; dropping the stream releases the channel.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::ChatMessage;
use crate::identifiers::ChatId;
use crate::Result;

/// Stream of newly inserted messages.
pub type MessageStream = BoxStream<'static, ChatMessage>;

#[async_trait]
pub trait RealtimeEffects: Send + Sync {
    /// Subscribe to message inserts for `chat`.
    ///
    /// Implementations may deliver events for other chats on a shared
    /// channel; consumers filter on `ChatMessage::chat_id`.
    async fn subscribe_messages(&self, chat: &ChatId) -> Result<MessageStream>;
}
