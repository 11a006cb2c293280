//! Domain Layer
//!
//! Tasks, principals and sessions plus the error taxonomy.
//! This layer has NO external dependencies (except serde/chrono/thiserror).

mod entity;
mod error;
mod principal;
mod task;

pub use entity::Entity;
pub use error::{TaskError, TaskResult};
pub use principal::{Principal, PrincipalId, Session};
pub use task::{validate_title, NewTask, Task, TaskId, TaskPatch};
