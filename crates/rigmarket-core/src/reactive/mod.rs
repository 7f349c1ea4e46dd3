//! # Reactive bindings for frontends
//!
//! Screens observe app-core state through [`Binding<T>`]: a shared value that
//! can be read synchronously, replaced, and awaited for changes.
//!
//! ## Design Principles
//!
//! 1. **Last value wins**: observers see the newest value; rapid updates
//!    coalesce instead of queueing.
//! 2. **Owned state**: each query, feed or store owns its binding and is the
//!    only writer. Frontends only read or watch.
//! 3. **Versioned**: every write bumps a version so sync frontends can poll
//!    cheaply with [`BindingWatcher::has_changed`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rigmarket_core::reactive::Binding;
//!
//! let count = Binding::new(0);
//! let mut watcher = count.watch();
//!
//! count.set(1);
//! assert_eq!(watcher.poll(), Some(1));
//! assert_eq!(watcher.poll(), None);
//! ```

mod binding;

pub use binding::{Binding, BindingWatcher};
