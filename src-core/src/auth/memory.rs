//! In-process auth service and session store

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::traits::{AuthService, SessionStore, SignUpOutcome};
use crate::domain::{Principal, PrincipalId, Session, TaskError, TaskResult};

struct Account {
    password: String,
    principal: Principal,
    confirmed: bool,
}

struct AuthInner {
    accounts: HashMap<String, Account>,
    access: HashMap<String, Principal>,
    refresh: HashMap<String, Principal>,
    next_user: u64,
    next_token: u64,
    require_confirmation: bool,
    now: DateTime<Utc>,
    ttl: Duration,
}

/// Auth service backed by a map of accounts; clones share state
#[derive(Clone)]
pub struct MemoryAuth {
    inner: Rc<RefCell<AuthInner>>,
}

impl MemoryAuth {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AuthInner {
                accounts: HashMap::new(),
                access: HashMap::new(),
                refresh: HashMap::new(),
                next_user: 1,
                next_token: 1,
                require_confirmation: false,
                now,
                ttl: Duration::hours(1),
            })),
        }
    }

    /// New accounts must be confirmed before they can sign in
    pub fn require_confirmation(self) -> Self {
        self.inner.borrow_mut().require_confirmation = true;
        self
    }

    /// Create a confirmed account
    pub fn register(&self, email: &str, password: &str) -> Principal {
        let mut inner = self.inner.borrow_mut();
        let principal = Principal {
            id: PrincipalId::new(format!("user-{}", inner.next_user)),
            email: Some(email.to_string()),
        };
        inner.next_user += 1;
        inner.accounts.insert(email.to_string(), Account {
            password: password.to_string(),
            principal: principal.clone(),
            confirmed: true,
        });
        principal
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        self.inner.borrow_mut().now = now;
    }

    /// Invalidate every issued token, as a server-side revocation would
    pub fn revoke_all(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.access.clear();
        inner.refresh.clear();
    }

    fn issue(inner: &mut AuthInner, principal: Principal) -> Session {
        let n = inner.next_token;
        inner.next_token += 1;
        let access_token = format!("access-{}", n);
        let refresh_token = format!("refresh-{}", n);
        inner.access.insert(access_token.clone(), principal.clone());
        inner.refresh.insert(refresh_token.clone(), principal.clone());
        Session { access_token, refresh_token, expires_at: inner.now + inner.ttl, user: principal }
    }
}

#[async_trait(?Send)]
impl AuthService for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> TaskResult<Session> {
        let mut inner = self.inner.borrow_mut();
        let principal = match inner.accounts.get(email) {
            Some(acc) if acc.password == password && acc.confirmed => acc.principal.clone(),
            Some(acc) if acc.password == password => return Err(TaskError::Auth("Email not confirmed".into())),
            _ => return Err(TaskError::Auth("Invalid login credentials".into())),
        };
        Ok(Self::issue(&mut inner, principal))
    }

    async fn sign_up(&self, email: &str, password: &str) -> TaskResult<SignUpOutcome> {
        if self.inner.borrow().accounts.contains_key(email) {
            return Err(TaskError::Auth("User already registered".into()));
        }
        let principal = self.register(email, password);
        let mut inner = self.inner.borrow_mut();
        if inner.require_confirmation {
            if let Some(acc) = inner.accounts.get_mut(email) {
                acc.confirmed = false;
            }
            return Ok(SignUpOutcome::PendingConfirmation);
        }
        Ok(SignUpOutcome::SignedIn(Self::issue(&mut inner, principal)))
    }

    async fn refresh(&self, refresh_token: &str) -> TaskResult<Session> {
        let mut inner = self.inner.borrow_mut();
        let principal = inner.refresh.remove(refresh_token)
            .ok_or_else(|| TaskError::Auth("Invalid Refresh Token".into()))?;
        Ok(Self::issue(&mut inner, principal))
    }

    async fn current_user(&self, access_token: &str) -> TaskResult<Principal> {
        self.inner.borrow().access.get(access_token).cloned()
            .ok_or_else(|| TaskError::Auth("invalid JWT".into()))
    }

    async fn sign_out(&self, access_token: &str) -> TaskResult<()> {
        self.inner.borrow_mut().access.remove(access_token);
        Ok(())
    }
}

/// Session store kept in memory; clones share the slot
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Rc<RefCell<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self { slot: Rc::new(RefCell::new(Some(session))) }
    }

    pub fn peek(&self) -> Option<Session> {
        self.slot.borrow().clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.slot.borrow().clone()
    }

    fn save(&self, session: &Session) {
        *self.slot.borrow_mut() = Some(session.clone());
    }

    fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }
}
