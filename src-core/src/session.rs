//! Session Boundary
//!
//! Tracks the current principal and gates everything that needs one.
//! Transitions come from explicit sign-in/sign-out, startup restoration,
//! token refresh and external invalidation; every transition persists the
//! session, updates the shared token slot and notifies listeners.

use chrono::{DateTime, Duration, Utc};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::auth::{parse_fragment, AuthService, SessionStore, SignUpOutcome, TokenSlot};
use crate::domain::{Principal, Session, TaskError, TaskResult};

/// Authentication state as seen by the UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Before the first check resolves
    #[default]
    Unknown,
    SignedOut,
    SignedIn(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.session().map(|s| &s.user)
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Unknown)
    }
}

type Listener = Rc<dyn Fn(&AuthState)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Keeps an `on_change` listener registered; dropping it unregisters.
pub struct ListenerGuard {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Reject empty credentials before any remote call
pub fn validate_credentials(email: &str, password: &str) -> TaskResult<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(TaskError::validation("Please provide both email and password."));
    }
    Ok(())
}

pub struct SessionBoundary<A, P> {
    auth: A,
    store: P,
    token: TokenSlot,
    state: RefCell<AuthState>,
    listeners: Rc<RefCell<Listeners>>,
    refresh_margin: Duration,
    refreshing: Cell<bool>,
}

impl<A: AuthService, P: SessionStore> SessionBoundary<A, P> {
    pub fn new(auth: A, store: P, token: TokenSlot, refresh_margin: Duration) -> Self {
        Self {
            auth,
            store,
            token,
            state: RefCell::new(AuthState::Unknown),
            listeners: Rc::new(RefCell::new(Listeners::default())),
            refresh_margin,
            refreshing: Cell::new(false),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.state.borrow().principal().cloned()
    }

    /// Register a session-change listener
    pub fn on_change(&self, listener: impl Fn(&AuthState) + 'static) -> ListenerGuard {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));
        ListenerGuard { id, listeners: Rc::downgrade(&self.listeners) }
    }

    fn transition(&self, next: AuthState) {
        match &next {
            AuthState::SignedIn(session) => {
                self.store.save(session);
                self.token.set(Some(session.access_token.clone()));
                log::info!("[session] signed in as {}", session.user.id);
            }
            AuthState::SignedOut => {
                self.store.clear();
                self.token.set(None);
                log::info!("[session] signed out");
            }
            AuthState::Unknown => {}
        }
        *self.state.borrow_mut() = next.clone();

        // Listeners may call back into the boundary
        let listeners: Vec<Listener> = self.listeners.borrow().entries.iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }

    /// Resolve the startup state: redirect fragment first, then the
    /// persisted session (refreshed when close to expiry).
    ///
    /// Always leaves the boundary resolved; an error from a bad redirect
    /// link is returned for display.
    pub async fn restore(&self, fragment: Option<&str>, now: DateTime<Utc>) -> TaskResult<()> {
        let mut link_error = None;
        if let Some(parsed) = fragment.and_then(|f| parse_fragment(f, now)) {
            match parsed {
                Ok(tokens) => match self.auth.current_user(&tokens.access_token).await {
                    Ok(user) => {
                        self.transition(AuthState::SignedIn(Session {
                            access_token: tokens.access_token,
                            refresh_token: tokens.refresh_token,
                            expires_at: tokens.expires_at,
                            user,
                        }));
                        return Ok(());
                    }
                    Err(e) => link_error = Some(e),
                },
                Err(e) => link_error = Some(e),
            }
        }

        let next = match self.store.load() {
            None => AuthState::SignedOut,
            Some(session) if !session.expires_within(now, self.refresh_margin) => AuthState::SignedIn(session),
            Some(session) => match self.auth.refresh(&session.refresh_token).await {
                Ok(fresh) => AuthState::SignedIn(fresh),
                Err(TaskError::Remote(e)) if !session.is_expired(now) => {
                    log::warn!("[session] refresh failed, keeping current token: {}", e);
                    AuthState::SignedIn(session)
                }
                Err(e) => {
                    log::warn!("[session] persisted session rejected: {}", e);
                    AuthState::SignedOut
                }
            },
        };
        self.transition(next);

        match link_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> TaskResult<Session> {
        validate_credentials(email, password)?;
        let session = self.auth.sign_in(email.trim(), password).await?;
        self.transition(AuthState::SignedIn(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> TaskResult<SignUpOutcome> {
        validate_credentials(email, password)?;
        let outcome = self.auth.sign_up(email.trim(), password).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.transition(AuthState::SignedIn(session.clone()));
        }
        Ok(outcome)
    }

    /// Local teardown happens first; the remote revocation is best effort.
    pub async fn sign_out(&self) {
        let session = self.state.borrow().session().cloned();
        self.transition(AuthState::SignedOut);
        if let Some(session) = session {
            if let Err(e) = self.auth.sign_out(&session.access_token).await {
                log::warn!("[session] remote sign-out failed: {}", e);
            }
        }
    }

    /// Refresh the access token when it expires within the margin.
    /// Returns whether a refresh happened.
    pub async fn refresh_if_due(&self, now: DateTime<Utc>) -> TaskResult<bool> {
        let session = match self.state.borrow().session() {
            Some(s) if s.expires_within(now, self.refresh_margin) => s.clone(),
            _ => return Ok(false),
        };
        if self.refreshing.replace(true) {
            return Ok(false);
        }
        let result = self.auth.refresh(&session.refresh_token).await;
        self.refreshing.set(false);

        // Signed out or replaced while the refresh was in flight
        if self.state.borrow().session() != Some(&session) {
            return Ok(false);
        }
        match result {
            Ok(fresh) => {
                log::debug!("[session] token refreshed");
                self.transition(AuthState::SignedIn(fresh));
                Ok(true)
            }
            Err(TaskError::Remote(e)) => Err(TaskError::Remote(e)),
            Err(e) => {
                self.invalidate("refresh rejected");
                Err(e)
            }
        }
    }

    /// The backend signalled that the credential is no longer valid
    pub fn invalidate(&self, reason: &str) {
        if self.state.borrow().session().is_some() {
            log::info!("[session] invalidated: {}", reason);
            self.transition(AuthState::SignedOut);
        }
    }
}
