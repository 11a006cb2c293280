//! Task Sync
//!
//! Per-view controller around the reconciler. User actions go to the row
//! store first and are merged only after the store succeeds; change
//! notifications are merged through the same rule. A generation counter
//! detects results that resolve after the view was torn down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::domain::{validate_title, PrincipalId, Task, TaskError, TaskId, TaskPatch, TaskResult};
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeFilter, EventSink, FeedEvent, FeedStatus, Subscription};
use crate::reconciler::{Change, LoadTicket, TaskList};
use crate::repository::TaskStore;

pub struct TaskSyncCallbacks {
    /// Called with the full list after every visible change
    pub on_refresh: Box<dyn Fn(&TaskList)>,
}

struct SyncState {
    list: TaskList,
    generation: u64,
    live: bool,
}

/// An initial fetch in flight
struct PendingLoad {
    generation: u64,
    ticket: LoadTicket,
}

pub struct TaskSync<S> {
    store: S,
    principal: PrincipalId,
    state: RefCell<SyncState>,
    callbacks: TaskSyncCallbacks,
}

impl<S: TaskStore> TaskSync<S> {
    pub fn new(store: S, principal: PrincipalId, callbacks: TaskSyncCallbacks) -> Rc<Self> {
        Rc::new(Self {
            store,
            principal,
            state: RefCell::new(SyncState { list: TaskList::new(), generation: 0, live: true }),
            callbacks,
        })
    }

    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    pub fn list(&self) -> TaskList {
        self.state.borrow().list.clone()
    }

    pub fn is_live(&self) -> bool {
        self.state.borrow().live
    }

    fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.state.borrow();
        state.live && state.generation == generation
    }

    fn refresh(&self) {
        let list = self.list();
        (self.callbacks.on_refresh)(&list);
    }

    fn apply_if_current(&self, generation: u64, change: Change) {
        if !self.is_current(generation) {
            log::warn!("[sync] discarding result for {} after teardown", change.id());
            return;
        }
        let changed = self.state.borrow_mut().list.apply(change);
        if changed {
            self.refresh();
        }
    }

    /// Rows from the store must belong to this principal
    fn owned(&self, task: Task) -> TaskResult<Task> {
        if task.is_owned_by(&self.principal) {
            Ok(task)
        } else {
            log::warn!("[sync] store returned task {} owned by another principal", task.id);
            Err(TaskError::NotFound(task.id.to_string()))
        }
    }

    fn start_load(&self) -> PendingLoad {
        let pending = {
            let mut state = self.state.borrow_mut();
            PendingLoad { generation: state.generation, ticket: state.list.begin_load() }
        };
        self.refresh();
        pending
    }

    fn complete_load(&self, pending: PendingLoad, result: TaskResult<Vec<Task>>) -> TaskResult<()> {
        if !self.is_current(pending.generation) {
            // The view is gone; neither rows nor errors are of use now
            log::warn!("[sync] discarding initial load after teardown");
            return Ok(());
        }
        match result {
            Ok(rows) => {
                let rows = rows.into_iter().filter(|t| t.is_owned_by(&self.principal)).collect();
                self.state.borrow_mut().list.finish_load(pending.ticket, rows);
                self.refresh();
                Ok(())
            }
            Err(e) => {
                self.state.borrow_mut().list.abort_load(pending.ticket);
                self.refresh();
                Err(e)
            }
        }
    }

    /// Replace the list with the store's rows
    pub async fn load(&self) -> TaskResult<()> {
        let pending = self.start_load();
        let result = self.store.list(&self.principal).await;
        self.complete_load(pending, result)
    }

    pub async fn add(&self, title: &str) -> TaskResult<Task> {
        let title = validate_title(title)?;
        let generation = self.generation();
        let task = self.owned(self.store.create(&self.principal, &title).await?)?;
        self.apply_if_current(generation, Change::Insert(task.clone()));
        Ok(task)
    }

    pub async fn toggle(&self, id: &TaskId) -> TaskResult<Task> {
        let current = self.state.borrow().list.get(id).map(|t| t.is_complete)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        self.update(id, TaskPatch::completion(!current)).await
    }

    pub async fn rename(&self, id: &TaskId, title: &str) -> TaskResult<Task> {
        let title = validate_title(title)?;
        self.update(id, TaskPatch::title(title)).await
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> TaskResult<Task> {
        let generation = self.generation();
        let task = self.owned(self.store.update(id, &patch).await?)?;
        self.apply_if_current(generation, Change::Update(task.clone()));
        Ok(task)
    }

    pub async fn delete(&self, id: &TaskId) -> TaskResult<()> {
        let generation = self.generation();
        self.store.delete(id).await?;
        self.apply_if_current(generation, Change::Delete(id.clone()));
        Ok(())
    }

    /// Merge a change notification. Events naming another owner are
    /// dropped even though the feed is filtered server-side.
    pub fn handle_change(&self, event: ChangeEvent) -> bool {
        if !self.is_live() {
            return false;
        }
        if let Some(owner) = event.owner() {
            if owner != &self.principal {
                log::warn!("[sync] ignoring {:?} event for another principal", event.kind);
                return false;
            }
        }
        let Some(change) = event.into_change() else {
            log::warn!("[sync] change event without a row");
            return false;
        };
        let changed = self.state.borrow_mut().list.apply(change);
        if changed {
            self.refresh();
        }
        changed
    }

    /// Clear the list and refuse anything still in flight
    pub fn teardown(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !state.live {
                return;
            }
            state.live = false;
            state.generation += 1;
            state.list.clear();
        }
        log::debug!("[sync] torn down for {}", self.principal);
        self.refresh();
    }
}

/// A task list bound to its change subscription for one signed-in view.
///
/// Dropping it tears the list down and releases the subscription, so every
/// exit path, including errors, cleans up.
pub struct LiveList<S: TaskStore> {
    sync: Rc<TaskSync<S>>,
    subscription: Option<Subscription>,
}

impl<S: TaskStore + 'static> LiveList<S> {
    pub fn open<F: ChangeFeed>(
        store: S,
        feed: &F,
        filter: ChangeFilter,
        callbacks: TaskSyncCallbacks,
        on_status: impl Fn(FeedStatus) + 'static,
    ) -> TaskResult<Self> {
        let sync = TaskSync::new(store, filter.owner.clone(), callbacks);
        let weak: Weak<TaskSync<S>> = Rc::downgrade(&sync);
        let sink: EventSink = Rc::new(move |event: FeedEvent| match event {
            FeedEvent::Change(change) => {
                if let Some(sync) = weak.upgrade() {
                    sync.handle_change(change);
                }
            }
            FeedEvent::Status(status) => on_status(status),
        });
        let subscription = feed.subscribe(filter, sink)?;
        log::info!("[sync] live list opened for {}", sync.principal());
        Ok(Self { sync, subscription: Some(subscription) })
    }
}

impl<S: TaskStore> LiveList<S> {
    pub fn sync(&self) -> Rc<TaskSync<S>> {
        self.sync.clone()
    }

    pub fn close(self) {}
}

impl<S: TaskStore> Drop for LiveList<S> {
    fn drop(&mut self) {
        self.sync.teardown();
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
