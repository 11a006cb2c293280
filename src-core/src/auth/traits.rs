//! Auth seams

use async_trait::async_trait;

use crate::domain::{Principal, Session, TaskResult};

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created; the user must follow the emailed link
    PendingConfirmation,
    /// Account created and confirmed immediately
    SignedIn(Session),
}

/// Hosted authentication service
#[async_trait(?Send)]
pub trait AuthService {
    async fn sign_in(&self, email: &str, password: &str) -> TaskResult<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> TaskResult<SignUpOutcome>;

    /// Exchange a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> TaskResult<Session>;

    /// Resolve the principal behind an access token
    async fn current_user(&self, access_token: &str) -> TaskResult<Principal>;

    /// Revoke the session remotely
    async fn sign_out(&self, access_token: &str) -> TaskResult<()>;
}

/// Where the session survives page reloads
pub trait SessionStore {
    fn load(&self) -> Option<Session>;
    fn save(&self, session: &Session);
    fn clear(&self);
}
