//! Messaging Workflow - sending chat messages

use rigmarket_core::domain::ChatMessage;
use rigmarket_core::effects::MarketplaceEffects;
use rigmarket_core::{ChatId, UserId};

use crate::errors::{AppError, AppResult};
use crate::queries::MessageFeed;

/// Longest accepted message, in characters
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Trim `content` and check it is sendable.
pub fn normalize_message(content: &str) -> AppResult<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::input("message is empty"));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::input(format!(
            "message is longer than {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(trimmed)
}

/// Send a message to `chat`.
///
/// The message reaches open feeds through realtime push. Pass the sender's
/// feed as `echo` to show it right away; the feed skips the pushed copy.
pub async fn send_message(
    marketplace: &dyn MarketplaceEffects,
    chat: ChatId,
    sender: UserId,
    content: &str,
    echo: Option<&MessageFeed>,
) -> AppResult<ChatMessage> {
    let content = normalize_message(content)?;
    let message = marketplace.send_message(&chat, &sender, content).await?;
    tracing::debug!(%chat, message = %message.id, "message sent");

    if let Some(feed) = echo {
        feed.append_local(message.clone());
    }
    Ok(message)
}
