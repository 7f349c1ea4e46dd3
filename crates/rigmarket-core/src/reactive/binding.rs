//! `Binding<T>` - an observable value backed by a tokio watch channel

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

struct BindingInner<T> {
    sender: watch::Sender<T>,
    version: AtomicU64,
}

/// A shared, observable value.
///
/// Clones share the same underlying value. Writes never fail, even when
/// nobody is watching.
pub struct Binding<T> {
    inner: Arc<BindingInner<T>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Binding<T> {
    /// Create a binding holding `value`.
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            inner: Arc::new(BindingInner {
                sender,
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Clone out the current value.
    pub fn get(&self) -> T {
        self.inner.sender.borrow().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.sender.borrow())
    }

    /// Number of writes so far.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Replace the value and notify watchers.
    pub fn set(&self, value: T) {
        self.inner.sender.send_replace(value);
        self.inner.version.fetch_add(1, Ordering::Release);
    }

    /// Modify the value in place and notify watchers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.inner.sender.send_modify(f);
        self.inner.version.fetch_add(1, Ordering::Release);
    }

    /// Start watching for changes made after this call.
    pub fn watch(&self) -> BindingWatcher<T> {
        BindingWatcher {
            receiver: self.inner.sender.subscribe(),
        }
    }

    /// Wait until the value satisfies `predicate` and return it.
    ///
    /// Resolves immediately if the current value already matches.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&T) -> bool) -> T {
        let mut receiver = self.inner.sender.subscribe();
        let value = match receiver.wait_for(|value| predicate(value)).await {
            Ok(value) => value.clone(),
            // The sender lives inside `self`, so the channel cannot close here.
            Err(_) => self.get(),
        };
        value
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Binding<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("value", &self.get())
            .field("version", &self.version())
            .finish()
    }
}

/// Observer handle returned by [`Binding::watch`].
pub struct BindingWatcher<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> BindingWatcher<T> {
    /// Whether the binding was written since the last `poll` or `changed`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Return the newest value if it changed since the last observation.
    pub fn poll(&mut self) -> Option<T> {
        if self.has_changed() {
            Some(self.receiver.borrow_and_update().clone())
        } else {
            None
        }
    }

    /// Wait for the next write and return the new value.
    ///
    /// Returns `None` once every `Binding` clone has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Current value regardless of change tracking.
    pub fn get(&self) -> T {
        self.receiver.borrow().clone()
    }
}
