//! Repository Layer - Core Traits
//!
//! The remote task table as seen by one client. Every call is a single
//! request/response round trip; none retry.

use async_trait::async_trait;

use crate::domain::{PrincipalId, Task, TaskId, TaskPatch, TaskResult};

/// CRUD against the remote task table.
///
/// Futures are `!Send`: the browser event loop is single-threaded.
#[async_trait(?Send)]
pub trait TaskStore {
    /// All rows owned by `owner`, newest first
    async fn list(&self, owner: &PrincipalId) -> TaskResult<Vec<Task>>;

    /// Insert a row with `is_complete = false`
    async fn create(&self, owner: &PrincipalId, title: &str) -> TaskResult<Task>;

    /// Apply `patch` and return the full updated row
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskResult<Task>;

    /// Remove a row
    async fn delete(&self, id: &TaskId) -> TaskResult<()>;
}
