use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::category::CategoryId;

/// A unique ID that can be used to refer to a task.
///
/// IDs come from a monotonic counter, so later tasks get larger IDs, but
/// there are no other guarantees.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How urgent a task is, as picked by the user.
#[derive(Debug, Default, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    // Position of this priority in the display order; lower sorts first.
    pub(crate) fn display_rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// A single to-do item.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    /// The category this task belongs to. Not enforced as a foreign key; a
    /// dangling reference is tolerated.
    pub category_id: CategoryId,
    pub priority: Priority,
    /// `None` means the task has no deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Set once at creation, immutable afterwards.
    pub created_at: DateTime<Utc>,
    /// Stamped when `completed` transitions from false to true. Un-completing
    /// a task keeps the old stamp as the last time it was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether the task is overdue: incomplete, with a due date strictly in
    /// the past.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Caller-supplied fields for a new task. Everything except the title falls
/// back to a default at creation.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft { title: title.into(), category_id: None, priority: None, due_date: None }
    }
}

/// A shallow merge onto an existing task: fields left `None` keep their
/// current value. There is deliberately no way to clear `completed_at`.
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the due date; `None` leaves it unchanged.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// A task id appeared more than once in seed records.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("duplicate task id {0}")]
pub struct DuplicateTaskId(pub TaskId);

/// Owns the task collection. Insertion order is preserved; all lookups are
/// linear scans, which holds up fine at to-do-list sizes.
#[derive(Debug)]
pub struct TasksTable {
    manifest: TasksManifest,
    tasks: Vec<Task>,
    /// Category assigned to tasks whose draft leaves the category unset.
    fallback_category: CategoryId,
}

#[derive(Debug)]
struct TasksManifest {
    /// The next ID to be assigned to a task.
    next_task_id: TaskId,
}

impl Default for TasksManifest {
    fn default() -> Self {
        TasksManifest { next_task_id: TaskId(1) }
    }
}

impl TasksTable {
    pub fn new(fallback_category: CategoryId) -> Self {
        TasksTable {
            manifest: TasksManifest::default(),
            tasks: Vec::new(),
            fallback_category,
        }
    }

    /// Seeds a table from existing records, resuming the id counter past the
    /// largest seeded id. Fails if two records share an id.
    pub fn from_records(
        fallback_category: CategoryId,
        records: Vec<Task>,
    ) -> Result<Self, DuplicateTaskId> {
        let mut seen = HashSet::new();
        let mut next_task_id = TaskId(1);
        for task in &records {
            if !seen.insert(task.id) {
                return Err(DuplicateTaskId(task.id));
            }
            next_task_id = next_task_id.max(TaskId(task.id.0.checked_add(1).unwrap()));
        }
        Ok(TasksTable {
            manifest: TasksManifest { next_task_id },
            tasks: records,
            fallback_category,
        })
    }

    // Returns a unique `TaskId` and marks that ID as used. Panics if the ID
    // space for this table is exhausted.
    fn gen_unique_task_id(&mut self) -> TaskId {
        let id = self.manifest.next_task_id;
        self.manifest.next_task_id = TaskId(id.0.checked_add(1).unwrap());
        id
    }

    /// Builds a task from the draft and appends it. Unset draft fields take
    /// their defaults: the table's fallback category, `Medium` priority, no
    /// deadline.
    pub fn insert(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> &Task {
        let id = self.gen_unique_task_id();
        let task = Task {
            id,
            title: draft.title,
            completed: false,
            category_id: draft.category_id.unwrap_or(self.fallback_category),
            priority: draft.priority.unwrap_or_default(),
            due_date: draft.due_date,
            created_at: now,
            completed_at: None,
        };
        self.tasks.push(task);
        self.tasks.last().expect("just pushed")
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Shallow-merges the patch onto the task with the given id. A
    /// false-to-true `completed` transition stamps `completed_at`; no other
    /// merge touches the stamp. Returns `None` if there is no such task.
    pub fn apply_patch(
        &mut self,
        id: TaskId,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        if let Some(completed) = patch.completed {
            if completed && !task.completed {
                task.completed_at = Some(now);
            }
            task.completed = completed;
        }
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(category_id) = patch.category_id {
            task.category_id = category_id;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        Some(task)
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
