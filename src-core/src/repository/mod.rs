//! Repository Layer
//!
//! Row store access for tasks:
//! - traits: the `TaskStore` seam
//! - rest: hosted row store over HTTP
//! - memory: in-process backend with owner policy and change feed (tests)

mod traits;
mod rest;
#[cfg(test)]
mod memory;


pub use traits::TaskStore;
pub use rest::RestTaskStore;
#[cfg(test)]
pub use memory::{MemoryBackend, MemoryTaskStore};
