//! Change Subscription
//!
//! Insert/update/delete notifications for the current principal's rows.
//! - event types shared by every feed
//! - `ChangeFeed`: the seam the UI transport and the in-memory backend implement
//! - protocol: Phoenix channel frames used by the hosted realtime service

mod event;
mod subscription;
pub mod protocol;

pub use event::{ChangeEvent, ChangeFilter, ChangeKind, FeedEvent, FeedStatus, RowKey};
pub use subscription::Subscription;

use std::rc::Rc;

use crate::domain::TaskResult;

/// Receiver for everything a feed delivers
pub type EventSink = Rc<dyn Fn(FeedEvent)>;

/// Source of change notifications.
///
/// `subscribe` opens exactly one subscription; it stays open until the
/// returned handle is released or dropped.
pub trait ChangeFeed {
    fn subscribe(&self, filter: ChangeFilter, sink: EventSink) -> TaskResult<Subscription>;
}
