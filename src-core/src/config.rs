//! Client Configuration
//!
//! Connection settings for the hosted backend.

use serde::{Deserialize, Serialize};

use crate::domain::{TaskError, TaskResult};

/// Hosted backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    pub url: String,
    /// Public API key sent as the `apikey` header
    pub anon_key: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u32,
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: i64,
    /// Where sign-up confirmation emails send the user back to
    #[serde(default)]
    pub redirect_to: Option<String>,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_table() -> String {
    "todos".to_string()
}

fn default_channel() -> String {
    "todos-changes".to_string()
}

fn default_heartbeat_interval_ms() -> u32 {
    25_000
}

fn default_refresh_margin_secs() -> i64 {
    60
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            schema: default_schema(),
            table: default_table(),
            channel: default_channel(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            refresh_margin_secs: default_refresh_margin_secs(),
            redirect_to: None,
        }
    }

    /// Values baked in at build time (`SUPABASE_URL`, `SUPABASE_KEY`)
    pub fn from_build_env() -> TaskResult<Self> {
        Self::from_values(option_env!("SUPABASE_URL"), option_env!("SUPABASE_KEY"))
    }

    pub fn from_values(url: Option<&str>, anon_key: Option<&str>) -> TaskResult<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())
            .ok_or_else(|| TaskError::Config("SUPABASE_URL is not set".to_string()))?;
        let key = anon_key.map(str::trim).filter(|k| !k.is_empty())
            .ok_or_else(|| TaskError::Config("SUPABASE_KEY is not set".to_string()))?;
        let config = Self::new(url, key);
        config.validate()?;
        Ok(config)
    }

    pub fn with_redirect_to(mut self, redirect_to: impl Into<String>) -> Self {
        self.redirect_to = Some(redirect_to.into());
        self
    }

    pub fn validate(&self) -> TaskResult<()> {
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(TaskError::Config(format!("invalid backend URL: {}", self.url)));
        }
        if self.table.is_empty() || self.channel.is_empty() {
            return Err(TaskError::Config("table and channel must be non-empty".to_string()));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(TaskError::Config("heartbeat interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    /// Realtime WebSocket endpoint (`ws(s)://<host>/realtime/v1/websocket`)
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.url.clone()
        };
        format!("{}/realtime/v1/websocket?apikey={}&vsn=1.0.0", ws_base, self.anon_key)
    }
}
