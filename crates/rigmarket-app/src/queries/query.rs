//! Generic keyed query
//!
//! A [`Query`] caches the result of one backend read for the current input
//! and exposes it as a [`Binding<LoadState<T>>`]. Changing the input issues a
//! new fetch; the previous one is aborted, and a completion that lost the
//! race is discarded by generation number.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rigmarket_core::reactive::Binding;
use rigmarket_core::Result;
use tokio::task::AbortHandle;

use super::state::LoadState;

/// Backend read for one key.
pub type Fetcher<K, T> = Arc<dyn Fn(K) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// What a call to [`Query::set_input`] or [`Query::refetch`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Input equal to the current one; nothing happened
    Unchanged,
    /// The state now reflects this call's fetch
    Settled,
    /// A newer call took over before this one finished
    Superseded,
}

struct Control<K> {
    /// `None` until the first `set_input`
    input: Option<Option<K>>,
    generation: u64,
    in_flight: Option<AbortHandle>,
}

impl<K> Control<K> {
    fn begin(&mut self) -> u64 {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }
        self.generation += 1;
        self.generation
    }
}

/// One data hook instance.
pub struct Query<K, T> {
    name: &'static str,
    fetcher: Fetcher<K, T>,
    timeout: Duration,
    state: Binding<LoadState<T>>,
    control: Arc<Mutex<Control<K>>>,
}

impl<K, T> Query<K, T>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Default + Send + Sync + 'static,
{
    /// Create an idle query. `name` only shows up in logs.
    pub fn new(name: &'static str, timeout: Duration, fetcher: Fetcher<K, T>) -> Self {
        Self {
            name,
            fetcher,
            timeout,
            state: Binding::new(LoadState::Idle),
            control: Arc::new(Mutex::new(Control {
                input: None,
                generation: 0,
                in_flight: None,
            })),
        }
    }

    /// Observable state
    pub fn state(&self) -> Binding<LoadState<T>> {
        self.state.clone()
    }

    /// Current state
    pub fn current(&self) -> LoadState<T> {
        self.state.get()
    }

    /// Current input, `None` when unset or cleared
    pub fn input(&self) -> Option<K> {
        self.control.lock().input.clone().flatten()
    }

    /// Point the query at `input` and fetch if it changed.
    pub async fn set_input(&self, input: Option<K>) -> FetchOutcome {
        {
            let mut control = self.control.lock();
            if control.input.as_ref() == Some(&input) {
                return FetchOutcome::Unchanged;
            }
            control.input = Some(input.clone());
        }
        self.run(input).await
    }

    /// Fetch again with the current input.
    pub async fn refetch(&self) -> FetchOutcome {
        let input = self.input();
        self.run(input).await
    }

    async fn run(&self, input: Option<K>) -> FetchOutcome {
        let handle = {
            let mut control = self.control.lock();
            let generation = control.begin();

            let Some(key) = input else {
                tracing::debug!(query = self.name, generation, "no input, settling empty");
                self.state.set(LoadState::Ready(T::default()));
                return FetchOutcome::Settled;
            };

            tracing::debug!(query = self.name, generation, "fetch started");
            self.state.set(LoadState::Loading);

            let fetch = (self.fetcher)(key);
            let handle = tokio::spawn(settle(
                self.name,
                generation,
                self.timeout,
                fetch,
                self.state.clone(),
                self.control.clone(),
            ));
            control.in_flight = Some(handle.abort_handle());
            handle
        };

        // An aborted task was replaced by a newer fetch or a dropped query.
        handle.await.unwrap_or(FetchOutcome::Superseded)
    }
}

async fn settle<K, T>(
    name: &'static str,
    generation: u64,
    timeout: Duration,
    fetch: BoxFuture<'static, Result<T>>,
    state: Binding<LoadState<T>>,
    control: Arc<Mutex<Control<K>>>,
) -> FetchOutcome
where
    T: Clone + Send + Sync + 'static,
{
    let result = tokio::time::timeout(timeout, fetch).await;

    let mut control = control.lock();
    if control.generation != generation {
        tracing::debug!(query = name, generation, "discarding stale result");
        return FetchOutcome::Superseded;
    }
    control.in_flight = None;

    let next = match result {
        Ok(Ok(value)) => LoadState::Ready(value),
        Ok(Err(err)) => {
            tracing::warn!(query = name, error = %err, "fetch failed");
            LoadState::Failed(err.message().to_string())
        }
        Err(_) => {
            tracing::warn!(
                query = name,
                timeout_ms = timeout.as_millis() as u64,
                "fetch timed out"
            );
            LoadState::Failed(format!(
                "request timed out after {} ms",
                timeout.as_millis()
            ))
        }
    };
    state.set(next);
    FetchOutcome::Settled
}

impl<K, T> Drop for Query<K, T> {
    fn drop(&mut self) {
        if let Some(handle) = self.control.lock().in_flight.take() {
            handle.abort();
        }
    }
}
