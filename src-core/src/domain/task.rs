//! Task Entity
//!
//! One row of the remote `todos` table. Field names match the table columns
//! so rows deserialize straight from the row store and realtime payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::entity::Entity;
use super::error::{TaskError, TaskResult};
use super::principal::PrincipalId;

/// Opaque task identifier assigned by the remote store.
///
/// The table may use a bigint or a uuid key, so both JSON numbers and strings
/// are accepted and kept in their canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => TaskId(n.to_string()),
            Raw::Text(s) => TaskId(s),
        })
    }
}

/// A to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub is_complete: bool,
    /// Owner; immutable after creation
    pub user_id: PrincipalId,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        &self.user_id == principal
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Insert payload for a new row
#[derive(Debug, Clone, Serialize)]
pub struct NewTask<'a> {
    pub title: &'a str,
    pub is_complete: bool,
    pub user_id: &'a PrincipalId,
}

impl<'a> NewTask<'a> {
    pub fn new(owner: &'a PrincipalId, title: &'a str) -> Self {
        Self { title, is_complete: false, user_id: owner }
    }
}

/// Partial update; only `Some` fields are sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

impl TaskPatch {
    pub fn completion(is_complete: bool) -> Self {
        Self { is_complete: Some(is_complete), ..Default::default() }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.is_complete.is_none()
    }

    /// Apply to a row the way the row store does
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(done) = self.is_complete {
            task.is_complete = done;
        }
    }
}

/// Trim a user-entered title, rejecting blank input
pub fn validate_title(raw: &str) -> TaskResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TaskError::validation("Task title cannot be empty."));
    }
    Ok(title.to_string())
}
