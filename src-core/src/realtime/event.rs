//! Change events

use serde::Deserialize;

use crate::config::ClientConfig;
use crate::domain::{PrincipalId, Task, TaskId};
use crate::reconciler::Change;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Previous row image. Depending on the table's replica identity a delete
/// may only carry the primary key, so the owner is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RowKey {
    pub id: TaskId,
    #[serde(default)]
    pub user_id: Option<PrincipalId>,
}

/// One notification from the change feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub new: Option<Task>,
    pub old: Option<RowKey>,
}

impl ChangeEvent {
    pub fn inserted(task: Task) -> Self {
        Self { kind: ChangeKind::Insert, new: Some(task), old: None }
    }

    pub fn updated(task: Task) -> Self {
        let old = RowKey { id: task.id.clone(), user_id: Some(task.user_id.clone()) };
        Self { kind: ChangeKind::Update, new: Some(task), old: Some(old) }
    }

    pub fn deleted(key: RowKey) -> Self {
        Self { kind: ChangeKind::Delete, new: None, old: Some(key) }
    }

    /// Owner named by the event, if the payload carries one
    pub fn owner(&self) -> Option<&PrincipalId> {
        self.new.as_ref().map(|t| &t.user_id)
            .or_else(|| self.old.as_ref().and_then(|k| k.user_id.as_ref()))
    }

    /// Translate into a reconciler change; `None` when the payload lacks
    /// the row the event kind needs
    pub fn into_change(self) -> Option<Change> {
        match self.kind {
            ChangeKind::Insert => self.new.map(Change::Insert),
            ChangeKind::Update => self.new.map(Change::Update),
            ChangeKind::Delete => self.old.map(|k| Change::Delete(k.id)),
        }
    }
}

/// Server-side filter for one subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub schema: String,
    pub table: String,
    pub owner: PrincipalId,
}

impl ChangeFilter {
    pub fn for_owner(config: &ClientConfig, owner: PrincipalId) -> Self {
        Self { schema: config.schema.clone(), table: config.table.clone(), owner }
    }

    /// Row filter expression understood by the realtime service
    pub fn row_filter(&self) -> String {
        format!("user_id=eq.{}", self.owner)
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.owner().map(|o| o == &self.owner).unwrap_or(true)
    }
}

/// Subscription health reported alongside events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Subscribed,
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Change(ChangeEvent),
    Status(FeedStatus),
}
