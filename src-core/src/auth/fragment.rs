//! Redirect fragment tokens
//!
//! Confirmation and magic links send the browser back with the session in the
//! URL fragment (`#access_token=...&refresh_token=...&expires_in=3600`).

use chrono::{DateTime, Duration, TimeZone, Utc};
use percent_encoding::percent_decode_str;

use crate::domain::{TaskError, TaskResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Parse a fragment (with or without the leading `#`).
///
/// `None` when the fragment carries neither tokens nor an error.
pub fn parse_fragment(fragment: &str, now: DateTime<Utc>) -> Option<TaskResult<FragmentTokens>> {
    let fragment = fragment.trim_start_matches('#');
    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_in = None;
    let mut expires_at = None;
    let mut error = None;
    let mut error_description = None;

    for pair in fragment.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = percent_decode_str(&value.replace('+', " ")).decode_utf8_lossy().to_string();
        match key {
            "access_token" => access_token = Some(value),
            "refresh_token" => refresh_token = Some(value),
            "expires_in" => expires_in = value.parse::<i64>().ok(),
            "expires_at" => expires_at = value.parse::<i64>().ok(),
            "error" => error = Some(value),
            "error_description" => error_description = Some(value),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(TaskError::Auth(error_description.unwrap_or(error))));
    }
    let (access_token, refresh_token) = (access_token?, refresh_token?);
    let expires_at = expires_at
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(|| now + Duration::seconds(expires_in.unwrap_or(3600)));
    Some(Ok(FragmentTokens { access_token, refresh_token, expires_at }))
}
