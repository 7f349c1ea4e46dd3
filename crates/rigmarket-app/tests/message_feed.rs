//! Message feed: history plus realtime inserts

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rigmarket_app::core::domain::{Chat, ChatMessage};
use rigmarket_app::core::MarketError;
use rigmarket_app::queries::{FetchOutcome, LoadState, MessageFeed};
use rigmarket_testkit::{fixtures, ops, InMemoryMarketplace};

fn feed(backend: &InMemoryMarketplace) -> MessageFeed {
    let backend = Arc::new(backend.clone());
    MessageFeed::new(backend.clone(), backend, Duration::from_secs(5))
}

fn seed_chat(backend: &InMemoryMarketplace, seed: u8, count: u32) -> Chat {
    let chat = fixtures::chat(seed);
    backend.seed_chat(chat.clone());
    for message in fixtures::conversation(&chat, count) {
        backend.seed_message(message);
    }
    chat
}

async fn wait_for_len(feed: &MessageFeed, len: usize) -> Vec<ChatMessage> {
    let state = feed
        .state()
        .wait_for(|s| s.data().is_some_and(|list| list.len() >= len))
        .await;
    state.data().cloned().unwrap()
}

fn contents(messages: &[ChatMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}

#[tokio::test]
async fn loads_history_then_appends_live_inserts() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 3);
    let feed = feed(&backend);

    assert_eq!(feed.set_chat(Some(chat.id)).await, FetchOutcome::Settled);
    assert_eq!(feed.current().data().unwrap().len(), 3);
    assert!(feed.is_live());

    backend.publish_message(fixtures::message(&chat, 3));
    let messages = wait_for_len(&feed, 4).await;
    assert_eq!(
        contents(&messages),
        vec!["message 0", "message 1", "message 2", "message 3"]
    );
}

#[tokio::test]
async fn event_already_in_history_shows_once() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 3);
    let feed = feed(&backend);
    feed.set_chat(Some(chat.id)).await;

    backend.publish_message(fixtures::message(&chat, 1));
    backend.publish_message(fixtures::message(&chat, 3));
    let messages = wait_for_len(&feed, 4).await;

    assert_eq!(messages.len(), 4);
    let ids: HashSet<_> = messages.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn inserts_during_history_load_are_kept() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 3);
    let feed = Arc::new(feed(&backend));

    let gate = backend.gate_next(ops::LIST_MESSAGES);
    let loading = {
        let feed = feed.clone();
        tokio::spawn(async move { feed.set_chat(Some(chat.id)).await })
    };
    backend.wait_for_calls(ops::LIST_MESSAGES, 1).await;
    assert!(feed.current().is_loading());

    // One duplicate of stored history, one new message
    backend.publish_message(fixtures::message(&chat, 2));
    backend.publish_message(fixtures::message(&chat, 3));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    gate.release();

    assert_eq!(loading.await.unwrap(), FetchOutcome::Settled);
    let messages = wait_for_len(&feed, 4).await;
    assert_eq!(
        contents(&messages),
        vec!["message 0", "message 1", "message 2", "message 3"]
    );
}

#[tokio::test]
async fn abandoned_chat_switch_still_goes_live() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 3);
    let feed = feed(&backend);

    let gate = backend.gate_next(ops::SUBSCRIBE_MESSAGES);
    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), feed.set_chat(Some(chat.id))).await;
    assert!(abandoned.is_err());
    assert!(feed.current().is_loading());
    gate.release();

    // The switch keeps running without its caller
    assert_eq!(feed.set_chat(Some(chat.id)).await, FetchOutcome::Unchanged);
    let messages = wait_for_len(&feed, 3).await;
    assert_eq!(contents(&messages), vec!["message 0", "message 1", "message 2"]);
    backend.wait_for_subscriptions(1).await;
    assert!(feed.is_live());

    backend.publish_message(fixtures::message(&chat, 3));
    assert_eq!(wait_for_len(&feed, 4).await.len(), 4);
}

#[tokio::test]
async fn inserts_for_other_chats_are_ignored() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 2);
    let other = seed_chat(&backend, 2, 0);
    let feed = feed(&backend);
    feed.set_chat(Some(chat.id)).await;

    backend.publish_message(fixtures::message(&other, 0));
    backend.publish_message(fixtures::message(&chat, 2));
    let messages = wait_for_len(&feed, 3).await;

    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|m| m.chat_id == chat.id));
}

#[tokio::test]
async fn one_subscription_across_chat_changes() {
    let backend = InMemoryMarketplace::new();
    let first = seed_chat(&backend, 1, 1);
    let second = seed_chat(&backend, 2, 2);
    let feed = feed(&backend);

    feed.set_chat(Some(first.id)).await;
    backend.wait_for_subscriptions(1).await;

    feed.set_chat(Some(second.id)).await;
    backend.wait_for_subscriptions(1).await;
    assert_eq!(feed.chat(), Some(second.id));
    assert_eq!(feed.current().data().unwrap().len(), 2);

    backend.publish_message(fixtures::message(&first, 5));
    backend.publish_message(fixtures::message(&second, 2));
    let messages = wait_for_len(&feed, 3).await;
    assert!(messages.iter().all(|m| m.chat_id == second.id));

    feed.set_chat(None).await;
    backend.wait_for_subscriptions(0).await;
    assert!(!feed.is_live());
    assert_eq!(feed.current(), LoadState::Ready(Vec::new()));
}

#[tokio::test]
async fn dropping_feed_closes_subscription() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 1);
    let feed = feed(&backend);
    feed.set_chat(Some(chat.id)).await;
    backend.wait_for_subscriptions(1).await;

    drop(feed);
    backend.wait_for_subscriptions(0).await;
}

#[tokio::test]
async fn same_chat_is_a_no_op() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 1);
    let feed = feed(&backend);

    feed.set_chat(Some(chat.id)).await;
    assert_eq!(feed.set_chat(Some(chat.id)).await, FetchOutcome::Unchanged);
    assert_eq!(backend.calls(ops::SUBSCRIBE_MESSAGES), 1);
    assert_eq!(backend.calls(ops::LIST_MESSAGES), 1);
}

#[tokio::test]
async fn no_chat_settles_empty_without_backend() {
    let backend = InMemoryMarketplace::new();
    let feed = feed(&backend);

    assert_eq!(feed.set_chat(None).await, FetchOutcome::Settled);
    assert_eq!(feed.current(), LoadState::Ready(Vec::new()));
    assert!(!feed.is_live());
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn subscription_failure_still_loads_history() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 4);
    backend.fail(ops::SUBSCRIBE_MESSAGES, MarketError::network("socket closed"));
    let feed = feed(&backend);

    assert_eq!(feed.set_chat(Some(chat.id)).await, FetchOutcome::Settled);
    assert_eq!(feed.current().data().unwrap().len(), 4);
    assert!(!feed.is_live());
    assert_eq!(backend.live_subscriptions(), 0);
}

#[tokio::test]
async fn history_failure_surfaces() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 4);
    backend.fail(ops::LIST_MESSAGES, MarketError::network("offline"));
    let feed = feed(&backend);

    feed.set_chat(Some(chat.id)).await;
    assert_eq!(feed.current(), LoadState::Failed("offline".to_string()));

    backend.clear_failure(ops::LIST_MESSAGES);
    assert_eq!(feed.refetch().await, FetchOutcome::Settled);
    assert_eq!(feed.current().data().unwrap().len(), 4);
    assert_eq!(backend.calls(ops::SUBSCRIBE_MESSAGES), 1);
}

#[tokio::test]
async fn local_append_skips_known_and_foreign_messages() {
    let backend = InMemoryMarketplace::new();
    let chat = seed_chat(&backend, 1, 2);
    let other = fixtures::chat(9);
    let feed = feed(&backend);
    feed.set_chat(Some(chat.id)).await;

    feed.append_local(fixtures::message(&chat, 1));
    feed.append_local(fixtures::message(&other, 0));
    assert_eq!(feed.current().data().unwrap().len(), 2);

    feed.append_local(fixtures::message(&chat, 2));
    assert_eq!(feed.current().data().unwrap().len(), 3);
}
