//! Shared HTTP plumbing for the row store and auth clients.

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::domain::TaskError;

/// Error body shapes returned by the hosted services.
///
/// The row store uses `message`/`code`, the auth service uses
/// `error_description`, `msg` or `message` depending on version.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Most specific human-readable message available
    pub fn text(&self) -> Option<String> {
        self.error_description.clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn code(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => self.error_code.clone(),
        }
    }
}

/// Attach `apikey` and bearer headers; anonymous calls use the public key.
pub(crate) fn authorize(builder: RequestBuilder, config: &ClientConfig, access_token: Option<&str>) -> RequestBuilder {
    let bearer = access_token.unwrap_or(&config.anon_key);
    builder
        .header("apikey", &config.anon_key)
        .header("Authorization", format!("Bearer {}", bearer))
}

/// Read a failed response into `(status, body)`
pub(crate) async fn failure(response: Response) -> (u16, ErrorBody) {
    let status = response.status().as_u16();
    let raw = response.text().await.unwrap_or_default();
    (status, ErrorBody::parse(&raw))
}

pub(crate) fn transport(err: reqwest::Error) -> TaskError {
    TaskError::Remote(err.to_string())
}
