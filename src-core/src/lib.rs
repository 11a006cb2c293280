//! Ocean Tasks Core
//!
//! Layered architecture:
//! - domain: tasks, principals, sessions and the error taxonomy
//! - repository: row store seam with hosted and in-memory implementations
//! - auth: auth service seam, session persistence, redirect fragments
//! - realtime: change feed seam, subscription handles, channel protocol
//! - reconciler: id-keyed merge of responses and notifications
//! - session: the signed-in/signed-out boundary
//! - sync: per-view controller binding a list to its subscription

pub mod config;
pub mod domain;
mod http;
pub mod repository;
pub mod auth;
pub mod realtime;
pub mod reconciler;
pub mod session;
pub mod sync;

pub use config::ClientConfig;
pub use domain::{Principal, PrincipalId, Session, Task, TaskError, TaskId, TaskPatch, TaskResult};
pub use reconciler::{Change, TaskList};
pub use session::{AuthState, ListenerGuard, SessionBoundary};
pub use sync::{LiveList, TaskSync, TaskSyncCallbacks};
