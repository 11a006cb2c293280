//! List Reconciler
//!
//! Single source of truth for the visible task list. Direct CRUD responses
//! and change notifications both funnel through [`merge`], which is keyed by
//! identifier and idempotent, so delivery order does not matter:
//!
//! - insert: absent → prepend, present → replace in place
//! - update: present → replace in place, absent → prepend
//! - delete: remove, unknown id → no-op
//!
//! While the initial fetch is in flight, changes are applied to the visible
//! list and also journaled; the fetched snapshot then replaces the list and
//! the journal is replayed on top of it.

use crate::domain::{Entity, Task, TaskId};

/// One incoming change, from a direct response or a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Insert(Task),
    Update(Task),
    Delete(TaskId),
}

impl Change {
    pub fn id(&self) -> &TaskId {
        match self {
            Change::Insert(t) | Change::Update(t) => t.id(),
            Change::Delete(id) => id,
        }
    }
}

/// Merge one change into `rows`. Returns whether `rows` changed.
pub fn merge<T: Entity + PartialEq>(rows: &mut Vec<T>, change: MergeOp<'_, T>) -> bool {
    match change {
        MergeOp::Upsert(row) => match rows.iter().position(|r| r.id() == row.id()) {
            Some(i) if rows[i] == *row => false,
            Some(i) => {
                rows[i] = row.clone();
                true
            }
            None => {
                rows.insert(0, row.clone());
                true
            }
        },
        MergeOp::Remove(id) => {
            let before = rows.len();
            rows.retain(|r| r.id() != id);
            rows.len() != before
        }
    }
}

/// Insert and update share one rule; the distinction only matters for logs
pub enum MergeOp<'a, T: Entity> {
    Upsert(&'a T),
    Remove(&'a T::Id),
}

impl<'a> From<&'a Change> for MergeOp<'a, Task> {
    fn from(change: &'a Change) -> Self {
        match change {
            Change::Insert(t) | Change::Update(t) => MergeOp::Upsert(t),
            Change::Delete(id) => MergeOp::Remove(id),
        }
    }
}

/// Identifies one initial fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Default, PartialEq)]
enum Phase {
    #[default]
    Idle,
    Loading { ticket: LoadTicket, journal: Vec<Change> },
    Ready,
}

/// Ordered, duplicate-free task list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
    phase: Phase,
    next_ticket: u64,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// True until the first snapshot has been applied
    pub fn is_loading(&self) -> bool {
        !matches!(self.phase, Phase::Ready)
    }

    /// Apply one change. Returns whether the visible list changed.
    pub fn apply(&mut self, change: Change) -> bool {
        let changed = merge(&mut self.tasks, MergeOp::from(&change));
        log::debug!("[reconciler] {:?} {} (changed={})", kind(&change), change.id(), changed);
        if let Phase::Loading { journal, .. } = &mut self.phase {
            journal.push(change);
        }
        changed
    }

    /// Start an initial fetch. A newer ticket supersedes older ones.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        let journal = match std::mem::take(&mut self.phase) {
            // A superseded load keeps its journal; those changes still count
            Phase::Loading { journal, .. } => journal,
            _ => Vec::new(),
        };
        self.phase = Phase::Loading { ticket, journal };
        ticket
    }

    /// Replace the list with a fetched snapshot, then replay changes that
    /// arrived while the fetch was in flight. Stale tickets are ignored.
    pub fn finish_load(&mut self, ticket: LoadTicket, snapshot: Vec<Task>) -> bool {
        let journal = match &mut self.phase {
            Phase::Loading { ticket: current, journal } if *current == ticket => std::mem::take(journal),
            _ => {
                log::warn!("[reconciler] ignoring superseded load {:?}", ticket);
                return false;
            }
        };
        self.phase = Phase::Ready;

        let mut tasks: Vec<Task> = Vec::with_capacity(snapshot.len());
        for task in snapshot {
            if !tasks.iter().any(|t| t.id == task.id) {
                tasks.push(task);
            }
        }
        // Stable: ties keep the store's order
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        for change in &journal {
            merge(&mut tasks, MergeOp::from(change));
        }
        log::debug!("[reconciler] snapshot of {} applied, {} replayed", tasks.len(), journal.len());
        self.tasks = tasks;
        true
    }

    /// A failed fetch ends loading without touching the list
    pub fn abort_load(&mut self, ticket: LoadTicket) {
        if matches!(&self.phase, Phase::Loading { ticket: current, .. } if *current == ticket) {
            self.phase = Phase::Ready;
        }
    }

    /// Drop every task (session ended)
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.phase = Phase::Idle;
    }
}

fn kind(change: &Change) -> &'static str {
    match change {
        Change::Insert(_) => "insert",
        Change::Update(_) => "update",
        Change::Delete(_) => "delete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PrincipalId;
    use chrono::{TimeZone, Utc};

    fn task(id: u64, title: &str, minute: u32) -> Task {
        Task {
            id: TaskId::from(id),
            title: title.to_string(),
            is_complete: false,
            user_id: PrincipalId::new("u1"),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
        }
    }

    fn ready(tasks: Vec<Task>) -> TaskList {
        let mut list = TaskList::new();
        let ticket = list.begin_load();
        list.finish_load(ticket, tasks);
        list
    }

    fn ids(list: &TaskList) -> Vec<String> {
        list.tasks().iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_insert_twice_is_idempotent() {
        let mut once = ready(vec![task(1, "a", 1)]);
        let mut twice = once.clone();
        once.apply(Change::Insert(task(2, "b", 2)));
        twice.apply(Change::Insert(task(2, "b", 2)));
        assert!(!twice.apply(Change::Insert(task(2, "b", 2))));
        assert_eq!(once.tasks(), twice.tasks());
        assert_eq!(ids(&once), vec!["2", "1"]);
    }

    #[test]
    fn test_update_twice_is_idempotent() {
        let mut list = ready(vec![task(2, "b", 2), task(1, "a", 1)]);
        let mut done = task(1, "a", 1);
        done.is_complete = true;
        assert!(list.apply(Change::Update(done.clone())));
        assert!(!list.apply(Change::Update(done.clone())));
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(&TaskId::from(1)), Some(&done));
    }

    #[test]
    fn test_duplicate_insert_replaces_in_place() {
        let mut list = ready(vec![task(3, "c", 3), task(2, "b", 2), task(1, "a", 1)]);
        assert!(list.apply(Change::Insert(task(2, "b renamed", 2))));
        assert_eq!(ids(&list), vec!["3", "2", "1"]);
        assert_eq!(list.tasks()[1].title, "b renamed");
    }

    #[test]
    fn test_update_keeps_position_or_prepends_when_unknown() {
        let mut list = ready(vec![task(2, "b", 2), task(1, "a", 1)]);
        list.apply(Change::Update(task(1, "a2", 1)));
        assert_eq!(ids(&list), vec!["2", "1"]);

        list.apply(Change::Update(task(9, "late", 0)));
        assert_eq!(ids(&list), vec!["9", "2", "1"]);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut list = ready(vec![task(2, "b", 2), task(1, "a", 1)]);
        let before = list.clone();
        assert!(!list.apply(Change::Delete(TaskId::from(42))));
        assert_eq!(list, before);

        assert!(list.apply(Change::Delete(TaskId::from(2))));
        assert_eq!(ids(&list), vec!["1"]);
    }

    #[test]
    fn test_snapshot_sorted_newest_first_and_deduplicated() {
        let list = ready(vec![task(1, "a", 1), task(3, "c", 3), task(2, "b", 2), task(3, "c", 3)]);
        assert_eq!(ids(&list), vec!["3", "2", "1"]);
        assert!(!list.is_loading());
    }

    #[test]
    fn test_create_lands_at_head() {
        let mut list = ready(vec![task(2, "b", 2), task(1, "a", 1)]);
        list.apply(Change::Insert(task(3, "new", 5)));
        assert_eq!(list.tasks()[0].title, "new");
    }

    #[test]
    fn test_update_before_snapshot_converges() {
        let a = task(1, "A", 2);
        let b = task(2, "B", 1);
        let mut a_done = a.clone();
        a_done.is_complete = true;

        // Event first, snapshot second
        let mut early = TaskList::new();
        let ticket = early.begin_load();
        early.apply(Change::Update(a_done.clone()));
        early.finish_load(ticket, vec![a.clone(), b.clone()]);

        // Snapshot first, event second
        let mut late = TaskList::new();
        let ticket = late.begin_load();
        late.finish_load(ticket, vec![a.clone(), b.clone()]);
        late.apply(Change::Update(a_done.clone()));

        assert_eq!(early.tasks(), late.tasks());
        assert_eq!(early.tasks(), &[a_done, b][..]);
    }

    #[test]
    fn test_delete_before_snapshot_is_replayed() {
        let mut list = TaskList::new();
        let ticket = list.begin_load();
        list.apply(Change::Delete(TaskId::from(1)));
        list.finish_load(ticket, vec![task(2, "b", 2), task(1, "a", 1)]);
        assert_eq!(ids(&list), vec!["2"]);
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let mut list = TaskList::new();
        let first = list.begin_load();
        list.apply(Change::Insert(task(5, "during", 9)));
        let second = list.begin_load();
        assert!(!list.finish_load(first, vec![task(1, "stale", 1)]));
        assert!(list.is_loading());
        assert!(list.finish_load(second, vec![task(2, "fresh", 2)]));
        assert_eq!(ids(&list), vec!["5", "2"]);
    }

    #[test]
    fn test_abort_keeps_applied_changes() {
        let mut list = TaskList::new();
        let ticket = list.begin_load();
        list.apply(Change::Insert(task(1, "a", 1)));
        list.abort_load(ticket);
        assert!(!list.is_loading());
        assert_eq!(ids(&list), vec!["1"]);
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut list = ready(vec![task(1, "a", 1)]);
        list.clear();
        assert!(list.is_empty());
        assert!(list.is_loading());
    }
}
