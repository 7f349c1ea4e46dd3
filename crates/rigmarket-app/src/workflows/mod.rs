//! # Workflows - Portable Business Logic
//!
//! Multi-step operations shared by every frontend. Each workflow validates
//! locally first and returns `AppError::Input` without touching the backend
//! when the request is malformed. Remote failures are returned as-is; no
//! workflow retries.
//!
//! Workflows return domain types. Refreshing affected queries is the
//! caller's job.

pub mod auth;
pub mod messaging;
pub mod review;
pub mod wishlist;

pub use auth::AuthFlow;
pub use messaging::send_message;
pub use review::submit_review;
pub use wishlist::{add_to_wishlist, remove_from_wishlist};
