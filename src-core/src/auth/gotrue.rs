//! Hosted Auth Service
//!
//! `AuthService` over the GoTrue endpoints of the hosted backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

use super::traits::{AuthService, SignUpOutcome};
use crate::config::ClientConfig;
use crate::domain::{Principal, PrincipalId, Session, TaskError, TaskResult};
use crate::http::{self, ErrorBody};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshArgs<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserResponse> for Principal {
    fn from(user: UserResponse) -> Self {
        Principal { id: PrincipalId::new(user.id), email: user.email }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserResponse,
}

impl TokenResponse {
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self.expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Map an auth failure onto the error taxonomy
pub(crate) fn classify(status: u16, body: &ErrorBody) -> TaskError {
    match status {
        400..=499 => TaskError::Auth(body.text().unwrap_or_else(|| "Authentication failed.".to_string())),
        _ => TaskError::Remote(body.text().unwrap_or_else(|| format!("auth service responded with status {}", status))),
    }
}

/// Auth client; cheap to clone
#[derive(Clone)]
pub struct GoTrueAuth {
    http: reqwest::Client,
    config: Rc<ClientConfig>,
}

impl GoTrueAuth {
    pub fn new(http: reqwest::Client, config: Rc<ClientConfig>) -> Self {
        Self { http, config }
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> TaskResult<T> {
        let response = builder.send().await.map_err(http::transport)?;
        if !response.status().is_success() {
            let (status, body) = http::failure(response).await;
            return Err(classify(status, &body));
        }
        response.json::<T>().await.map_err(http::transport)
    }

    async fn token_grant<B: Serialize>(&self, grant_type: &str, body: &B) -> TaskResult<Session> {
        let builder = self.http.post(self.config.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .json(body);
        let token: TokenResponse = self.send(http::authorize(builder, &self.config, None)).await?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait(?Send)]
impl AuthService for GoTrueAuth {
    async fn sign_in(&self, email: &str, password: &str) -> TaskResult<Session> {
        self.token_grant("password", &Credentials { email, password }).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> TaskResult<SignUpOutcome> {
        let mut builder = self.http.post(self.config.auth_url("signup"))
            .json(&Credentials { email, password });
        if let Some(redirect_to) = &self.config.redirect_to {
            builder = builder.query(&[("redirect_to", redirect_to.as_str())]);
        }
        let body: Value = self.send(http::authorize(builder, &self.config, None)).await?;
        sign_up_outcome(body, Utc::now())
    }

    async fn refresh(&self, refresh_token: &str) -> TaskResult<Session> {
        self.token_grant("refresh_token", &RefreshArgs { refresh_token }).await
    }

    async fn current_user(&self, access_token: &str) -> TaskResult<Principal> {
        let builder = self.http.get(self.config.auth_url("user"));
        let user: UserResponse = self.send(http::authorize(builder, &self.config, Some(access_token))).await?;
        Ok(user.into())
    }

    async fn sign_out(&self, access_token: &str) -> TaskResult<()> {
        let builder = self.http.post(self.config.auth_url("logout"));
        let response = http::authorize(builder, &self.config, Some(access_token))
            .send().await.map_err(http::transport)?;
        if response.status().is_success() {
            return Ok(());
        }
        let (status, body) = http::failure(response).await;
        match status {
            // Already gone remotely
            401 | 403 | 404 => Ok(()),
            _ => Err(classify(status, &body)),
        }
    }
}

/// With email confirmation enabled the service answers with a bare user;
/// otherwise it returns a full token response.
pub(crate) fn sign_up_outcome(body: Value, now: DateTime<Utc>) -> TaskResult<SignUpOutcome> {
    if body.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| TaskError::remote(format!("unexpected sign-up response: {}", e)))?;
        return Ok(SignUpOutcome::SignedIn(token.into_session(now)));
    }
    Ok(SignUpOutcome::PendingConfirmation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_token_response_expiry() {
        let body = json!({
            "access_token": "at", "token_type": "bearer", "expires_in": 3600,
            "refresh_token": "rt", "user": { "id": "u1", "email": "a@b.c" }
        });
        let token: TokenResponse = serde_json::from_value(body).unwrap();
        let session = token.into_session(now());
        assert_eq!(session.expires_at, now() + Duration::seconds(3600));
        assert_eq!(session.user.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_explicit_expires_at_wins() {
        let body = json!({
            "access_token": "at", "expires_in": 3600, "expires_at": 1714557600,
            "refresh_token": "rt", "user": { "id": "u1" }
        });
        let token: TokenResponse = serde_json::from_value(body).unwrap();
        assert_eq!(token.into_session(now()).expires_at.timestamp(), 1714557600);
    }

    #[test]
    fn test_sign_up_outcomes() {
        let pending = json!({ "id": "u1", "email": "a@b.c", "confirmation_sent_at": "2024-05-01T10:00:00Z" });
        assert_eq!(sign_up_outcome(pending, now()).unwrap(), SignUpOutcome::PendingConfirmation);

        let immediate = json!({
            "access_token": "at", "expires_in": 60, "refresh_token": "rt", "user": { "id": "u1" }
        });
        assert!(matches!(sign_up_outcome(immediate, now()).unwrap(), SignUpOutcome::SignedIn(_)));
    }

    #[test]
    fn test_classify() {
        let body = ErrorBody::parse(r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#);
        assert_eq!(classify(400, &body), TaskError::Auth("Email not confirmed".into()));
        assert_eq!(classify(422, &ErrorBody::parse(r#"{"code":422,"msg":"User already registered"}"#)),
                   TaskError::Auth("User already registered".into()));
        assert!(matches!(classify(502, &ErrorBody::default()), TaskError::Remote(_)));
    }
}
