//! rigmarket Effects - production handlers for infrastructure effects
//!
//! Stateless or self-contained implementations of the infrastructure traits
//! declared in `rigmarket-core`:
//!
//! - [`FilesystemStorageHandler`]: one file per key under a base directory
//! - [`MemoryStorageHandler`]: process-local map, for tests and previews
//! - [`SystemClockHandler`]: wall clock
//! - [`SimulatedTimeHandler`]: manually driven clock for tests and demos
//!
//! Backend handlers (auth, marketplace, realtime) belong to the host app's
//! backend client and are not part of this crate.

#![forbid(unsafe_code)]

pub mod storage;
pub mod time;

pub use storage::{FilesystemStorageHandler, MemoryStorageHandler};
pub use time::{SimulatedTimeHandler, SystemClockHandler};
