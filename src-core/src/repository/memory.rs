//! In-process backend
//!
//! Row store plus change feed held in memory. It enforces the same owner
//! policy the hosted service applies through row-level security, and
//! notifies subscribers synchronously, before the mutating call returns.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::traits::TaskStore;
use crate::domain::{validate_title, PrincipalId, Task, TaskError, TaskId, TaskPatch, TaskResult};
use crate::realtime::{
    ChangeEvent, ChangeFeed, ChangeFilter, EventSink, FeedEvent, FeedStatus, RowKey, Subscription,
};

struct Subscriber {
    id: u64,
    filter: ChangeFilter,
    sink: EventSink,
}

struct BackendInner {
    rows: Vec<Task>,
    next_id: u64,
    next_subscriber: u64,
    clock: DateTime<Utc>,
    subscribers: Vec<Subscriber>,
    fail_next: Option<TaskError>,
    echo: bool,
}

/// Shared in-memory backend; clones share state
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Rc<RefCell<BackendInner>>,
}

impl MemoryBackend {
    /// Rows created later get later timestamps, one second apart
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BackendInner {
                rows: Vec::new(),
                next_id: 1,
                next_subscriber: 1,
                clock: start,
                subscribers: Vec::new(),
                fail_next: None,
                echo: true,
            })),
        }
    }

    /// A row store acting as `principal`
    pub fn client(&self, principal: PrincipalId) -> MemoryTaskStore {
        MemoryTaskStore { backend: self.clone(), acting: principal }
    }

    /// Insert a row directly, without notifying anyone
    pub fn seed(&self, owner: &PrincipalId, title: &str) -> Task {
        self.inner.borrow_mut().insert(owner, title)
    }

    /// Fail the next store call with `err`
    pub fn fail_next(&self, err: TaskError) {
        self.inner.borrow_mut().fail_next = Some(err);
    }

    /// Toggle change notifications for store mutations
    pub fn set_echo(&self, echo: bool) {
        self.inner.borrow_mut().echo = echo;
    }

    pub fn rows(&self) -> Vec<Task> {
        self.inner.borrow().rows.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Deliver `event` to every subscriber whose filter matches
    pub fn emit(&self, event: ChangeEvent) {
        let sinks: Vec<EventSink> = self.inner.borrow().subscribers.iter()
            .filter(|s| s.filter.matches(&event))
            .map(|s| s.sink.clone())
            .collect();
        for sink in sinks {
            sink(FeedEvent::Change(event.clone()));
        }
    }

    /// Deliver `event` to every subscriber, bypassing filters
    pub fn inject(&self, event: FeedEvent) {
        let sinks: Vec<EventSink> = self.inner.borrow().subscribers.iter().map(|s| s.sink.clone()).collect();
        for sink in sinks {
            sink(event.clone());
        }
    }

    fn take_failure(&self) -> TaskResult<()> {
        match self.inner.borrow_mut().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn notify(&self, event: ChangeEvent) {
        if self.inner.borrow().echo {
            self.emit(event);
        }
    }
}

impl BackendInner {
    fn insert(&mut self, owner: &PrincipalId, title: &str) -> Task {
        let task = Task {
            id: TaskId::from(self.next_id),
            title: title.to_string(),
            is_complete: false,
            user_id: owner.clone(),
            created_at: self.clock,
        };
        self.next_id += 1;
        self.clock += Duration::seconds(1);
        self.rows.push(task.clone());
        task
    }

    fn owned_mut(&mut self, id: &TaskId, acting: &PrincipalId) -> TaskResult<&mut Task> {
        self.rows.iter_mut()
            .find(|t| &t.id == id && t.is_owned_by(acting))
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }
}

impl ChangeFeed for MemoryBackend {
    fn subscribe(&self, filter: ChangeFilter, sink: EventSink) -> TaskResult<Subscription> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_subscriber;
            inner.next_subscriber += 1;
            inner.subscribers.push(Subscriber { id, filter, sink: sink.clone() });
            id
        };
        log::debug!("[memory] subscriber {} joined", id);
        sink(FeedEvent::Status(FeedStatus::Subscribed));

        let weak: Weak<RefCell<BackendInner>> = Rc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|s| s.id != id);
                log::debug!("[memory] subscriber {} left", id);
            }
        }))
    }
}

/// Row store view of a [`MemoryBackend`] for one principal
#[derive(Clone)]
pub struct MemoryTaskStore {
    backend: MemoryBackend,
    acting: PrincipalId,
}

impl MemoryTaskStore {
    pub fn acting(&self) -> &PrincipalId {
        &self.acting
    }
}

#[async_trait(?Send)]
impl TaskStore for MemoryTaskStore {
    async fn list(&self, owner: &PrincipalId) -> TaskResult<Vec<Task>> {
        self.backend.take_failure()?;
        if owner != &self.acting {
            // Row-level security hides other principals' rows
            return Ok(Vec::new());
        }
        let mut rows: Vec<Task> = self.backend.inner.borrow().rows.iter()
            .filter(|t| t.is_owned_by(owner))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create(&self, owner: &PrincipalId, title: &str) -> TaskResult<Task> {
        self.backend.take_failure()?;
        let title = validate_title(title)?;
        if owner != &self.acting {
            return Err(TaskError::remote("new row violates row-level security policy for table \"todos\""));
        }
        let task = self.backend.inner.borrow_mut().insert(owner, &title);
        self.backend.notify(ChangeEvent::inserted(task.clone()));
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskResult<Task> {
        self.backend.take_failure()?;
        if patch.is_empty() {
            return Err(TaskError::validation("Nothing to update."));
        }
        let task = {
            let mut inner = self.backend.inner.borrow_mut();
            let row = inner.owned_mut(id, &self.acting)?;
            patch.apply_to(row);
            row.clone()
        };
        self.backend.notify(ChangeEvent::updated(task.clone()));
        Ok(task)
    }

    async fn delete(&self, id: &TaskId) -> TaskResult<()> {
        self.backend.take_failure()?;
        {
            let mut inner = self.backend.inner.borrow_mut();
            inner.owned_mut(id, &self.acting)?;
            inner.rows.retain(|t| &t.id != id);
        }
        // Default replica identity: the old image only carries the key
        self.backend.notify(ChangeEvent::deleted(RowKey { id: id.clone(), user_id: None }));
        Ok(())
    }
}
