//! Auth Workflow - sign in, sign up and sign out
//!
//! Credentials are validated locally before anything reaches the provider.
//! Provider failures come back as [`AppError::Auth`] with the provider's
//! description, except outages and timeouts, which are network errors.
//! Nothing is retried.

use std::sync::Arc;

use rigmarket_core::domain::Session;
use rigmarket_core::effects::AuthEffects;
use rigmarket_core::reactive::Binding;
use rigmarket_core::MarketError;

use crate::errors::{AppError, AppResult};

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Allowed username lengths
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=30;

/// Check the shape of an email address.
///
/// Requires one `@`, a non-empty local part and a dotted domain without
/// empty labels.
pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::input("email must contain @"));
    };
    if local.is_empty() {
        return Err(AppError::input("email is missing the part before @"));
    }
    if domain.contains('@') {
        return Err(AppError::input("email must contain a single @"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(AppError::input("email must not contain spaces"));
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(AppError::input("email domain is not valid"));
    }
    Ok(())
}

/// Check password length
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::input(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Check username length and characters
pub fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if !USERNAME_LEN.contains(&len) {
        return Err(AppError::input(format!(
            "username must be {} to {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AppError::input(
            "username may only contain letters, digits, _, - and .",
        ));
    }
    Ok(())
}

/// Session holder for the signed-in user
pub struct AuthFlow {
    auth: Arc<dyn AuthEffects>,
    session: Binding<Option<Session>>,
}

impl AuthFlow {
    /// Create a signed-out flow
    pub fn new(auth: Arc<dyn AuthEffects>) -> Self {
        Self {
            auth,
            session: Binding::new(None),
        }
    }

    /// Observable session
    pub fn session(&self) -> Binding<Option<Session>> {
        self.session.clone()
    }

    /// Whether a session is held
    pub fn is_signed_in(&self) -> bool {
        self.session.with(Option::is_some)
    }

    /// Email/password sign-in
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        validate_email(email)?;
        validate_password(password)?;
        let session = self
            .auth
            .sign_in(email.trim(), password)
            .await
            .map_err(auth_error)?;
        Ok(self.established(session, "password"))
    }

    /// Create an account and sign it in
    pub async fn sign_up(&self, email: &str, password: &str, username: &str) -> AppResult<Session> {
        validate_email(email)?;
        validate_password(password)?;
        validate_username(username)?;
        let session = self
            .auth
            .sign_up(email.trim(), password, username)
            .await
            .map_err(auth_error)?;
        Ok(self.established(session, "sign_up"))
    }

    /// Sign in through Google
    pub async fn sign_in_with_google(&self) -> AppResult<Session> {
        let session = self.auth.sign_in_with_google().await.map_err(auth_error)?;
        Ok(self.established(session, "google"))
    }

    /// Sign in with Apple
    pub async fn sign_in_with_apple(&self) -> AppResult<Session> {
        let session = self.auth.sign_in_with_apple().await.map_err(auth_error)?;
        Ok(self.established(session, "apple"))
    }

    /// End the session. The local session is cleared only if the provider
    /// accepted the sign-out.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.auth.sign_out().await.map_err(auth_error)?;
        tracing::info!("signed out");
        self.session.set(None);
        Ok(())
    }

    fn established(&self, session: Session, method: &'static str) -> Session {
        tracing::info!(user = %session.user.id, method, "signed in");
        self.session.set(Some(session.clone()));
        session
    }
}

fn auth_error(err: MarketError) -> AppError {
    tracing::warn!(error = %err, "auth provider rejected request");
    match err {
        MarketError::Network { .. } | MarketError::Timeout { .. } => AppError::from(err),
        other => AppError::auth(other.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("ana@rig.market").is_ok());
        assert!(validate_email("  ana@rig.market ").is_ok());
        assert!(validate_email("ana.rig.market").is_err());
        assert!(validate_email("@rig.market").is_err());
        assert!(validate_email("ana@rig").is_err());
        assert!(validate_email("ana@@rig.market").is_err());
        assert!(validate_email("ana@rig..market").is_err());
        assert!(validate_email("an a@rig.market").is_err());
    }

    #[test]
    fn password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("gpu_hunter-99.x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("rig master").is_err());
    }

    #[test]
    fn outages_are_not_auth_failures() {
        assert_eq!(
            auth_error(MarketError::auth("Invalid login credentials")),
            AppError::auth("Invalid login credentials")
        );
        assert_eq!(
            auth_error(MarketError::permission_denied("banned")),
            AppError::auth("banned")
        );
        assert!(matches!(
            auth_error(MarketError::network("offline")),
            AppError::Network { .. }
        ));
        assert!(matches!(
            auth_error(MarketError::timeout("sign_in")),
            AppError::Network { .. }
        ));
    }
}
