//! Live message list for one chat
//!
//! A [`MessageFeed`] joins the chat history with realtime insert events.
//! It subscribes before fetching history so nothing sent in between is
//! missed. Events that arrive while the history is loading are held back
//! and appended once it settles. Message ids already shown are skipped, so
//! an event that is also part of the fetched history appears once.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use rigmarket_core::domain::ChatMessage;
use rigmarket_core::effects::{MarketplaceEffects, MessageStream, RealtimeEffects};
use rigmarket_core::reactive::Binding;
use rigmarket_core::{ChatId, MessageId};
use tokio::task::AbortHandle;

use super::query::FetchOutcome;
use super::state::LoadState;

#[derive(Default)]
struct FeedControl {
    /// `None` until the first `set_chat`
    chat: Option<Option<ChatId>>,
    /// Bumped on every chat change
    generation: u64,
    /// Bumped on every history load
    load_seq: u64,
    loading: bool,
    live: bool,
    listener: Option<AbortHandle>,
    /// Subscribe-then-load task started by `set_chat`
    connect: Option<AbortHandle>,
    /// History reload started by `refetch`
    history: Option<AbortHandle>,
    seen: HashSet<MessageId>,
    pending: Vec<ChatMessage>,
}

impl FeedControl {
    fn teardown(&mut self) {
        for task in [
            self.listener.take(),
            self.connect.take(),
            self.history.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        self.live = false;
        self.loading = false;
        self.seen.clear();
        self.pending.clear();
    }

    /// Take one message into the list, or hold it while history loads.
    fn accept(&mut self, message: ChatMessage, state: &Binding<LoadState<Vec<ChatMessage>>>) {
        if self.loading {
            self.pending.push(message);
            return;
        }
        if !state.with(|s| matches!(s, LoadState::Ready(_))) {
            return;
        }
        if self.seen.insert(message.id) {
            state.update(|s| {
                if let LoadState::Ready(list) = s {
                    list.push(message);
                }
            });
        }
    }

    /// Replace the list with `history` followed by held-back events.
    fn merge(&mut self, history: Vec<ChatMessage>) -> Vec<ChatMessage> {
        self.seen.clear();
        let mut merged = Vec::with_capacity(history.len() + self.pending.len());
        for message in history.into_iter().chain(self.pending.drain(..)) {
            if self.seen.insert(message.id) {
                merged.push(message);
            }
        }
        merged
    }
}

/// Message list of the active chat with realtime updates.
///
/// At most one realtime subscription is live per feed. Switching chats or
/// dropping the feed tears it down. Subscribing and loading run as tasks,
/// so a call abandoned by its caller still settles.
pub struct MessageFeed {
    shared: Shared,
}

#[derive(Clone)]
struct Shared {
    marketplace: Arc<dyn MarketplaceEffects>,
    realtime: Arc<dyn RealtimeEffects>,
    timeout: Duration,
    state: Binding<LoadState<Vec<ChatMessage>>>,
    control: Arc<Mutex<FeedControl>>,
}

impl MessageFeed {
    /// Create an idle feed
    pub fn new(
        marketplace: Arc<dyn MarketplaceEffects>,
        realtime: Arc<dyn RealtimeEffects>,
        timeout: Duration,
    ) -> Self {
        Self {
            shared: Shared {
                marketplace,
                realtime,
                timeout,
                state: Binding::new(LoadState::Idle),
                control: Arc::new(Mutex::new(FeedControl::default())),
            },
        }
    }

    /// Observable message list
    pub fn state(&self) -> Binding<LoadState<Vec<ChatMessage>>> {
        self.shared.state.clone()
    }

    /// Current message list state
    pub fn current(&self) -> LoadState<Vec<ChatMessage>> {
        self.shared.state.get()
    }

    /// Chat the feed follows
    pub fn chat(&self) -> Option<ChatId> {
        self.shared.control.lock().chat.flatten()
    }

    /// Whether a realtime subscription is active
    pub fn is_live(&self) -> bool {
        self.shared.control.lock().live
    }

    /// Follow `chat`, replacing any previous subscription.
    pub async fn set_chat(&self, chat: Option<ChatId>) -> FetchOutcome {
        let handle = {
            let mut control = self.shared.control.lock();
            if control.chat == Some(chat) {
                return FetchOutcome::Unchanged;
            }
            control.teardown();
            control.chat = Some(chat);
            control.generation += 1;

            let Some(chat) = chat else {
                tracing::debug!("message feed cleared");
                self.shared.state.set(LoadState::Ready(Vec::new()));
                return FetchOutcome::Settled;
            };

            // Hold events from the moment the subscription exists.
            control.loading = true;
            control.load_seq += 1;
            self.shared.state.set(LoadState::Loading);

            let handle = tokio::spawn(connect(
                self.shared.clone(),
                chat,
                control.generation,
                control.load_seq,
            ));
            control.connect = Some(handle.abort_handle());
            handle
        };

        handle.await.unwrap_or(FetchOutcome::Superseded)
    }

    /// Reload history for the current chat, keeping the subscription.
    pub async fn refetch(&self) -> FetchOutcome {
        let handle = {
            let mut control = self.shared.control.lock();
            let Some(chat) = control.chat.flatten() else {
                return FetchOutcome::Unchanged;
            };
            if let Some(previous) = control.history.take() {
                previous.abort();
            }
            control.loading = true;
            control.load_seq += 1;
            self.shared.state.set(LoadState::Loading);

            let handle = tokio::spawn(load_history(
                self.shared.clone(),
                chat,
                control.generation,
                control.load_seq,
            ));
            control.history = Some(handle.abort_handle());
            handle
        };

        handle.await.unwrap_or(FetchOutcome::Superseded)
    }

    /// Add a message this client already has, e.g. the result of a send.
    ///
    /// Ignored if it belongs to another chat or is already shown.
    pub fn append_local(&self, message: ChatMessage) {
        let mut control = self.shared.control.lock();
        if control.chat.flatten() != Some(message.chat_id) {
            return;
        }
        control.accept(message, &self.shared.state);
    }
}

/// Subscribe to `chat`, then load its history.
async fn connect(shared: Shared, chat: ChatId, generation: u64, seq: u64) -> FetchOutcome {
    match shared.realtime.subscribe_messages(&chat).await {
        Ok(stream) => {
            let mut control = shared.control.lock();
            if control.generation != generation {
                return FetchOutcome::Superseded;
            }
            let listener = tokio::spawn(listen(
                chat,
                generation,
                stream,
                shared.state.clone(),
                shared.control.clone(),
            ));
            control.listener = Some(listener.abort_handle());
            control.live = true;
            tracing::debug!(%chat, "subscribed to messages");
        }
        Err(err) => {
            tracing::warn!(%chat, error = %err, "message subscription failed");
        }
    }

    load_history(shared, chat, generation, seq).await
}

/// Fetch history and merge it with events held back meanwhile.
///
/// Only the newest load for the current chat may settle the state.
async fn load_history(shared: Shared, chat: ChatId, generation: u64, seq: u64) -> FetchOutcome {
    let result =
        tokio::time::timeout(shared.timeout, shared.marketplace.list_messages(&chat)).await;

    let mut control = shared.control.lock();
    if control.generation != generation || control.load_seq != seq {
        return FetchOutcome::Superseded;
    }
    control.loading = false;

    match result {
        Ok(Ok(history)) => {
            let merged = control.merge(history);
            tracing::debug!(%chat, count = merged.len(), "message history loaded");
            shared.state.set(LoadState::Ready(merged));
        }
        Ok(Err(err)) => {
            tracing::warn!(%chat, error = %err, "message history failed");
            control.pending.clear();
            shared.state.set(LoadState::Failed(err.message().to_string()));
        }
        Err(_) => {
            tracing::warn!(%chat, "message history timed out");
            control.pending.clear();
            shared.state.set(LoadState::Failed(format!(
                "request timed out after {} ms",
                shared.timeout.as_millis()
            )));
        }
    }
    FetchOutcome::Settled
}

async fn listen(
    chat: ChatId,
    generation: u64,
    mut stream: MessageStream,
    state: Binding<LoadState<Vec<ChatMessage>>>,
    control: Arc<Mutex<FeedControl>>,
) {
    while let Some(message) = stream.next().await {
        if message.chat_id != chat {
            continue;
        }
        let mut control = control.lock();
        if control.generation != generation {
            return;
        }
        control.accept(message, &state);
    }

    let mut control = control.lock();
    if control.generation == generation {
        tracing::debug!(%chat, "message stream ended");
        control.live = false;
        control.listener = None;
    }
}

impl Drop for MessageFeed {
    fn drop(&mut self) {
        self.shared.control.lock().teardown();
    }
}

impl std::fmt::Debug for MessageFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageFeed")
            .field("chat", &self.chat())
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}
