//! Data hooks against the in-memory backend

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use rigmarket_app::core::domain::{PartCategory, ProductFilters};
use rigmarket_app::core::{MarketError, OrderId, ProductId, UserId};
use rigmarket_app::queries::{DataQueries, FetchOutcome, LoadState};
use rigmarket_testkit::{fixtures, ops, InMemoryMarketplace};

fn queries(backend: &InMemoryMarketplace) -> DataQueries {
    let backend = Arc::new(backend.clone());
    DataQueries::new(
        backend.clone(),
        backend.clone(),
        backend,
        Duration::from_secs(5),
    )
}

fn seeded() -> InMemoryMarketplace {
    let backend = InMemoryMarketplace::new();
    backend.seed_product(fixtures::product(1, "RTX 3080 Founders", 45_000));
    backend.seed_product(fixtures::product(2, "RX 6700 XT", 28_000));
    backend.seed_product(fixtures::product_in(
        3,
        "Ryzen 7 5800X",
        19_000,
        PartCategory::Cpu,
    ));
    backend
}

#[tokio::test]
async fn products_load_newest_first() {
    let backend = seeded();
    let query = queries(&backend).products(ProductFilters::default()).await;

    let titles: Vec<String> = query
        .current()
        .data()
        .unwrap()
        .iter()
        .map(|p| p.title.clone())
        .collect();
    assert_eq!(titles, vec!["Ryzen 7 5800X", "RX 6700 XT", "RTX 3080 Founders"]);
    assert_eq!(backend.calls(ops::LIST_PRODUCTS), 1);
}

#[tokio::test]
async fn changing_filters_refetches_once() {
    let backend = seeded();
    let query = queries(&backend).products(ProductFilters::default()).await;

    let gpus = ProductFilters::category(PartCategory::Gpu);
    assert_eq!(query.set_input(Some(gpus.clone())).await, FetchOutcome::Settled);
    assert_eq!(query.current().data().unwrap().len(), 2);

    assert_eq!(query.set_input(Some(gpus)).await, FetchOutcome::Unchanged);
    assert_eq!(backend.calls(ops::LIST_PRODUCTS), 2);
}

#[tokio::test]
async fn missing_keys_never_reach_backend() {
    let backend = seeded();
    let q = queries(&backend);

    let orders = q.orders(None).await;
    let wishlist = q.wishlist(None).await;
    let chats = q.chats(None).await;
    let product = q.product(None).await;
    let order = q.order(None).await;
    let chat = q.chat(None).await;

    assert_eq!(orders.current(), LoadState::Ready(Vec::new()));
    assert_eq!(wishlist.current(), LoadState::Ready(Vec::new()));
    assert_eq!(chats.current(), LoadState::Ready(Vec::new()));
    assert_eq!(product.current(), LoadState::Ready(None));
    assert_eq!(order.current(), LoadState::Ready(None));
    assert_eq!(chat.current(), LoadState::Ready(None));
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn detail_queries_return_records() {
    let backend = seeded();
    let listing = fixtures::product(1, "RTX 3080 Founders", 45_000);
    backend.seed_order(fixtures::order(7, &listing));
    let q = queries(&backend);

    let product = q.product(Some(ProductId::from_seed(1))).await;
    assert_eq!(product.current().data().unwrap().as_ref(), Some(&listing));

    let missing = q.product(Some(ProductId::from_seed(99))).await;
    assert_eq!(missing.current(), LoadState::Ready(None));

    let order = q.order(Some(OrderId::from_seed(7))).await;
    assert_eq!(order.current().data().unwrap().as_ref().unwrap().amount_cents, 45_000);

    let orders = q.orders(Some(fixtures::buyer().id)).await;
    assert_eq!(orders.current().data().unwrap().len(), 1);
}

#[tokio::test]
async fn failures_surface_in_state() {
    let backend = seeded();
    backend.fail(ops::LIST_CHATS, MarketError::network("connection reset"));

    let chats = queries(&backend).chats(Some(UserId::from_seed(1))).await;
    assert_eq!(chats.current(), LoadState::Failed("connection reset".to_string()));

    backend.clear_failure(ops::LIST_CHATS);
    assert_eq!(chats.refetch().await, FetchOutcome::Settled);
    assert_eq!(chats.current(), LoadState::Ready(Vec::new()));
}

#[tokio::test]
async fn slow_earlier_fetch_cannot_overwrite_newer_data() {
    let backend = seeded();
    let query = Arc::new(queries(&backend).products(ProductFilters::default()).await);

    // First change is held by the backend
    let gate = backend.gate_next(ops::LIST_PRODUCTS);
    let slow = {
        let query = query.clone();
        tokio::spawn(async move {
            query
                .set_input(Some(ProductFilters::category(PartCategory::Gpu)))
                .await
        })
    };
    backend.wait_for_calls(ops::LIST_PRODUCTS, 2).await;
    assert!(query.current().is_loading());

    // Second change goes through immediately
    let cpus = ProductFilters::category(PartCategory::Cpu);
    assert_eq!(query.set_input(Some(cpus)).await, FetchOutcome::Settled);
    gate.release();

    assert_eq!(slow.await.unwrap(), FetchOutcome::Superseded);
    let products = query.current();
    let products = products.data().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].category, PartCategory::Cpu);
}

#[tokio::test]
async fn clearing_input_cancels_in_flight_fetch() {
    let backend = seeded();
    let buyer = fixtures::buyer().id;
    let query = Arc::new(queries(&backend).wishlist(None).await);

    let gate = backend.gate_next(ops::LIST_WISHLIST);
    let pending = {
        let query = query.clone();
        tokio::spawn(async move { query.set_input(Some(buyer)).await })
    };
    backend.wait_for_calls(ops::LIST_WISHLIST, 1).await;

    assert_eq!(query.set_input(None).await, FetchOutcome::Settled);
    gate.release();

    assert_eq!(pending.await.unwrap(), FetchOutcome::Superseded);
    assert_eq!(query.current(), LoadState::Ready(Vec::new()));
}

#[tokio::test]
async fn fetch_times_out() {
    let backend = seeded();
    let _gate = backend.gate_next(ops::GET_PRODUCT);
    let backend_arc = Arc::new(backend.clone());
    let q = DataQueries::new(
        backend_arc.clone(),
        backend_arc.clone(),
        backend_arc,
        Duration::from_millis(50),
    );

    let product = q.product(Some(ProductId::from_seed(1))).await;
    let state = product.current();
    assert!(state.error().unwrap().contains("timed out"));
}

#[tokio::test]
async fn current_user_follows_session() {
    let backend = seeded();
    let q = queries(&backend);

    let signed_out = q.current_user().await;
    assert_eq!(signed_out.current(), LoadState::Ready(None));

    backend.seed_account(fixtures::buyer(), "hunter22");
    let auth = rigmarket_app::workflows::AuthFlow::new(Arc::new(backend.clone()));
    auth.sign_in("gpu_hunter@rig.test", "hunter22").await.unwrap();

    signed_out.refetch().await;
    assert_eq!(
        signed_out.current().data().unwrap().as_ref().map(|u| u.username.as_str()),
        Some("gpu_hunter")
    );
}

#[tokio::test]
async fn state_binding_can_be_awaited() {
    let backend = seeded();
    let query = Arc::new(queries(&backend).products(ProductFilters::default()).await);
    let state = query.state();

    let gate = backend.gate_next(ops::LIST_PRODUCTS);
    let refetch = {
        let query = query.clone();
        tokio::spawn(async move { query.refetch().await })
    };

    assert!(state.wait_for(|s| s.is_loading()).await.is_loading());
    gate.release();
    assert_eq!(refetch.await.unwrap(), FetchOutcome::Settled);
    assert_eq!(state.get().data().map(Vec::len), Some(3));
}
