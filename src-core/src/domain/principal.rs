//! Principal and Session
//!
//! The authenticated identity and the credentials that prove it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque principal identifier (the auth service's user id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Principal,
}

impl Session {
    pub fn principal_id(&self) -> &PrincipalId {
        &self.user.id
    }

    /// True when the access token expires within `margin` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at - margin <= now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at,
            user: Principal { id: PrincipalId::new("u1"), email: Some("a@b.c".into()) },
        }
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let s = session(now + Duration::seconds(30));
        assert!(!s.is_expired(now));
        assert!(s.expires_within(now, Duration::seconds(60)));
        assert!(!s.expires_within(now, Duration::seconds(10)));
        assert!(s.is_expired(now + Duration::seconds(30)));
    }

    #[test]
    fn test_session_json_roundtrip_keeps_principal() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_string(&session(now)).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.principal_id().as_str(), "u1");
    }
}
