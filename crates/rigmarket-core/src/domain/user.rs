//! Users and auth sessions

use serde::{Deserialize, Serialize};

use crate::identifiers::UserId;

/// Public profile of a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier
    pub id: UserId,
    /// Sign-in email
    pub email: String,
    /// Display handle
    pub username: String,
    /// Avatar image URL
    pub avatar_url: Option<String>,
}

/// An authenticated session returned by the auth provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Signed-in user
    pub user: UserProfile,
    /// Bearer token for backend calls
    pub access_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .finish()
    }
}
