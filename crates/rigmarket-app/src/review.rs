//! Review prompt for chats
//!
//! After enough back-and-forth in a chat, the user is asked to rate the other
//! party, unless they already did. The decision is [`should_prompt_review`];
//! [`ReviewPromptWatcher`] feeds it from the backend.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rigmarket_core::effects::MarketplaceEffects;
use rigmarket_core::reactive::Binding;
use rigmarket_core::{ChatId, MarketError, UserId};
use tokio::task::AbortHandle;

/// Messages a chat needs before the prompt appears
pub const REVIEW_PROMPT_MESSAGE_THRESHOLD: u64 = 10;

/// Whether to ask for a review.
#[must_use]
pub fn should_prompt_review(message_count: u64, review_exists: bool) -> bool {
    message_count >= REVIEW_PROMPT_MESSAGE_THRESHOLD && !review_exists
}

/// A pending request to review the other chat participant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewPrompt {
    /// Chat the review is about
    pub chat_id: ChatId,
    /// User to be reviewed
    pub reviewee_id: UserId,
    /// Messages exchanged so far
    pub message_count: u64,
}

#[derive(Default)]
struct WatchControl {
    inputs: Option<(Option<ChatId>, Option<UserId>)>,
    generation: u64,
    dismissed: bool,
    in_flight: Option<AbortHandle>,
}

impl WatchControl {
    /// Abort any running evaluation and start a new generation.
    fn begin(&mut self) -> u64 {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }
        self.generation += 1;
        self.generation
    }
}

/// Evaluates the review prompt for one chat screen.
///
/// Evaluations run as tasks, so one abandoned by its caller still settles.
/// Any backend failure hides the prompt. Nothing is retried; call
/// [`ReviewPromptWatcher::refresh`] to evaluate again.
pub struct ReviewPromptWatcher {
    marketplace: Arc<dyn MarketplaceEffects>,
    timeout: Duration,
    prompt: Binding<Option<ReviewPrompt>>,
    control: Arc<Mutex<WatchControl>>,
}

impl ReviewPromptWatcher {
    /// Create a watcher with no inputs and no prompt
    pub fn new(marketplace: Arc<dyn MarketplaceEffects>, timeout: Duration) -> Self {
        Self {
            marketplace,
            timeout,
            prompt: Binding::new(None),
            control: Arc::new(Mutex::new(WatchControl::default())),
        }
    }

    /// Observable prompt
    pub fn prompt(&self) -> Binding<Option<ReviewPrompt>> {
        self.prompt.clone()
    }

    /// Whether the prompt is showing
    pub fn is_prompting(&self) -> bool {
        self.prompt.with(Option::is_some)
    }

    /// Evaluate for `chat` as seen by `user`. Returns whether the prompt shows.
    ///
    /// Unchanged inputs keep the current result without a backend call. New
    /// inputs hide the previous prompt right away.
    pub async fn set_inputs(&self, chat: Option<ChatId>, user: Option<UserId>) -> bool {
        {
            let mut control = self.control.lock();
            if control.inputs == Some((chat, user)) {
                return self.is_prompting();
            }
            control.inputs = Some((chat, user));
            control.dismissed = false;
            self.prompt.set(None);
        }
        self.evaluate().await
    }

    /// Evaluate again with the current inputs, e.g. after a new message.
    pub async fn refresh(&self) -> bool {
        self.evaluate().await
    }

    /// Hide the prompt until the inputs change.
    pub fn dismiss(&self) {
        let mut control = self.control.lock();
        control.dismissed = true;
        control.begin();
        self.prompt.set(None);
    }

    async fn evaluate(&self) -> bool {
        let handle = {
            let mut control = self.control.lock();
            let generation = control.begin();
            let inputs = control.inputs.unwrap_or((None, None));
            let (chat, user) = match inputs {
                (Some(chat), Some(user)) if !control.dismissed => (chat, user),
                _ => {
                    self.prompt.set(None);
                    return false;
                }
            };

            let handle = tokio::spawn(settle(
                self.marketplace.clone(),
                self.timeout,
                chat,
                user,
                generation,
                self.prompt.clone(),
                self.control.clone(),
            ));
            control.in_flight = Some(handle.abort_handle());
            handle
        };

        // Aborted by a newer evaluation, a dismiss or a drop.
        match handle.await {
            Ok(showing) => showing,
            Err(_) => self.is_prompting(),
        }
    }
}

async fn settle(
    marketplace: Arc<dyn MarketplaceEffects>,
    timeout: Duration,
    chat: ChatId,
    user: UserId,
    generation: u64,
    prompt: Binding<Option<ReviewPrompt>>,
    control: Arc<Mutex<WatchControl>>,
) -> bool {
    let decision = tokio::time::timeout(timeout, decide(marketplace.as_ref(), chat, user)).await;
    let next = match decision {
        Ok(Ok(next)) => next,
        Ok(Err(err)) => {
            tracing::warn!(%chat, error = %err, "review prompt check failed");
            None
        }
        Err(_) => {
            tracing::warn!(%chat, "review prompt check timed out");
            None
        }
    };

    let mut control = control.lock();
    if control.generation != generation {
        return prompt.with(Option::is_some);
    }
    control.in_flight = None;
    let showing = next.is_some();
    prompt.set(next);
    showing
}

async fn decide(
    marketplace: &dyn MarketplaceEffects,
    chat: ChatId,
    user: UserId,
) -> Result<Option<ReviewPrompt>, MarketError> {
    let message_count = marketplace.count_messages(&chat).await?;
    if message_count < REVIEW_PROMPT_MESSAGE_THRESHOLD {
        return Ok(None);
    }

    let record = marketplace
        .get_chat(&chat)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("chat {chat}")))?;
    let reviewee_id = record.counterpart(&user).ok_or_else(|| {
        MarketError::permission_denied(format!("user {user} is not part of chat {chat}"))
    })?;

    let review_exists = marketplace.review_exists(&chat, &user).await?;
    if !should_prompt_review(message_count, review_exists) {
        return Ok(None);
    }

    tracing::debug!(%chat, message_count, "review prompt shown");
    Ok(Some(ReviewPrompt {
        chat_id: chat,
        reviewee_id,
        message_count,
    }))
}

impl Drop for ReviewPromptWatcher {
    fn drop(&mut self) {
        if let Some(handle) = self.control.lock().in_flight.take() {
            handle.abort();
        }
    }
}
