//! Authentication provider
//!
//! Each call either yields a session or a [`crate::MarketError::Auth`] carrying the
//! provider's description. No retries are layered on top.

use async_trait::async_trait;

use crate::domain::{Session, UserProfile};
use crate::Result;

#[async_trait]
pub trait AuthEffects: Send + Sync {
    /// Email/password sign-in.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<Session>;

    /// OAuth sign-in through Google.
    async fn sign_in_with_google(&self) -> Result<Session>;

    /// Sign in with Apple.
    async fn sign_in_with_apple(&self) -> Result<Session>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Profile of the signed-in user, if any.
    async fn current_user(&self) -> Result<Option<UserProfile>>;
}
