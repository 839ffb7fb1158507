use chrono::Utc;
use thiserror::Error;

use crate::data::category::CategoryId;
use crate::data::task::{Task, TaskDraft, TaskId, TaskPatch, TasksTable};
use crate::query::TaskStats;

use super::latency::Latency;

/// Error type for task store operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskStoreError {
    /// No task in the store has the requested id.
    #[error("no task with id {0}")]
    NotFound(TaskId),
}

/// Asynchronous access to the task collection.
///
/// Every operation waits out a simulated round-trip before touching the
/// table, then performs a single atomic read or mutation and hands back
/// owned copies. The store presumes one logical caller; interleaved updates
/// racing on the same id resolve to whichever lands last.
#[derive(Debug)]
pub struct TaskStore {
    table: TasksTable,
    latency: Latency,
}

impl TaskStore {
    pub fn new(table: TasksTable, latency: Latency) -> Self {
        TaskStore { table, latency }
    }

    /// Copies of all tasks, in insertion order.
    pub async fn get_all(&self) -> Vec<Task> {
        self.latency.wait().await;
        self.table.iter().cloned().collect()
    }

    pub async fn get_by_id(&self, id: TaskId) -> Option<Task> {
        self.latency.wait().await;
        self.table.get(id).cloned()
    }

    /// Builds a task from the draft and appends it to the collection.
    pub async fn create(&mut self, draft: TaskDraft) -> Task {
        self.latency.wait().await;
        let task = self.table.insert(draft, Utc::now()).clone();
        tracing::debug!(id = %task.id, title = %task.title, "created task");
        task
    }

    /// Shallow-merges the patch onto the stored task. Completing a task
    /// stamps `completed_at`; see [`TasksTable::apply_patch`].
    pub async fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task, TaskStoreError> {
        self.latency.wait().await;
        let task = self
            .table
            .apply_patch(id, patch, Utc::now())
            .ok_or(TaskStoreError::NotFound(id))?
            .clone();
        tracing::debug!(id = %task.id, completed = task.completed, "updated task");
        Ok(task)
    }

    /// Removes the task and returns the removed copy.
    pub async fn delete(&mut self, id: TaskId) -> Result<Task, TaskStoreError> {
        self.latency.wait().await;
        let task = self.table.remove(id).ok_or(TaskStoreError::NotFound(id))?;
        tracing::debug!(id = %task.id, "deleted task");
        Ok(task)
    }

    pub async fn get_by_category(&self, category_id: CategoryId) -> Vec<Task> {
        self.latency.wait().await;
        self.table.iter().filter(|task| task.category_id == category_id).cloned().collect()
    }

    /// Case-insensitive substring search on titles. An empty query matches
    /// everything.
    pub async fn search(&self, query: &str) -> Vec<Task> {
        self.latency.wait().await;
        if query.is_empty() {
            return self.table.iter().cloned().collect();
        }
        let query = query.to_lowercase();
        self.table
            .iter()
            .filter(|task| task.title.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Incomplete tasks whose due date is strictly in the past.
    pub async fn get_overdue(&self) -> Vec<Task> {
        self.latency.wait().await;
        let now = Utc::now();
        self.table.iter().filter(|task| task.is_overdue(now)).cloned().collect()
    }

    pub async fn get_stats(&self) -> TaskStats {
        self.latency.wait().await;
        TaskStats::collect(self.table.iter(), Utc::now())
    }
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration};

    use crate::data::task::Priority;

    use super::*;

    const FALLBACK: CategoryId = CategoryId(1);

    fn store() -> TaskStore {
        TaskStore::new(TasksTable::new(FALLBACK), Latency::none())
    }

    fn due_in(days: i64) -> Option<DateTime<Utc>> {
        Some(Utc::now() + Duration::days(days))
    }

    #[tokio::test]
    async fn create_then_get_by_id_round_trips() {
        let mut store = store();
        let created = store.create(TaskDraft::new("water the plants")).await;
        assert_eq!(store.get_by_id(created.id).await, Some(created));
    }

    #[tokio::test]
    async fn delete_removes_the_task() {
        let mut store = store();
        let created = store.create(TaskDraft::new("a")).await;

        let removed = store.delete(created.id).await.unwrap();
        assert_eq!(removed, created);
        assert_eq!(store.get_by_id(created.id).await, None);
        assert_eq!(store.delete(created.id).await, Err(TaskStoreError::NotFound(created.id)));
    }

    #[tokio::test]
    async fn update_of_a_missing_id_is_not_found() {
        let mut store = store();
        let result = store.update(TaskId(42), TaskPatch::default()).await;
        assert_eq!(result, Err(TaskStoreError::NotFound(TaskId(42))));
    }

    #[tokio::test]
    async fn completing_stamps_completed_at_at_or_after_the_request() {
        let mut store = store();
        let id = store.create(TaskDraft::new("a")).await.id;

        let before = Utc::now();
        let patch = TaskPatch { completed: Some(true), ..TaskPatch::default() };
        let task = store.update(id, patch.clone()).await.unwrap();
        let stamp = task.completed_at.unwrap();
        assert!(stamp >= before);
        assert!(stamp <= Utc::now());

        // repeating the update leaves the stamp unchanged
        let task = store.update(id, patch).await.unwrap();
        assert_eq!(task.completed_at, Some(stamp));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_empty_matches_all() {
        let mut store = store();
        store.create(TaskDraft::new("Buy Groceries")).await;
        store.create(TaskDraft::new("Morning run")).await;

        let found = store.search("groc").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Buy Groceries");

        assert_eq!(store.search("").await.len(), 2);
        assert!(store.search("plumber").await.is_empty());
    }

    #[tokio::test]
    async fn get_by_category_matches_exactly() {
        let mut store = store();
        let draft = TaskDraft { category_id: Some(CategoryId(2)), ..TaskDraft::new("a") };
        store.create(draft).await;
        store.create(TaskDraft::new("b")).await;

        assert_eq!(store.get_by_category(CategoryId(2)).await.len(), 1);
        assert_eq!(store.get_by_category(FALLBACK).await.len(), 1);
        assert!(store.get_by_category(CategoryId(9)).await.is_empty());
    }

    #[tokio::test]
    async fn overdue_excludes_completed_and_undated_tasks() {
        let mut store = store();
        let overdue =
            store.create(TaskDraft { due_date: due_in(-1), ..TaskDraft::new("late") }).await;
        store.create(TaskDraft { due_date: due_in(1), ..TaskDraft::new("upcoming") }).await;
        store.create(TaskDraft::new("undated")).await;
        let done = store.create(TaskDraft { due_date: due_in(-2), ..TaskDraft::new("done") }).await;
        let patch = TaskPatch { completed: Some(true), ..TaskPatch::default() };
        store.update(done.id, patch).await.unwrap();

        let found = store.get_overdue().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, overdue.id);
    }

    #[tokio::test]
    async fn stats_track_the_collection() {
        let mut store = store();
        assert_eq!(store.get_stats().await, TaskStats::default());

        store.create(TaskDraft { due_date: due_in(-1), ..TaskDraft::new("late") }).await;
        let done = store.create(TaskDraft::new("done")).await;
        store
            .update(done.id, TaskPatch { completed: Some(true), ..TaskPatch::default() })
            .await
            .unwrap();
        store.create(TaskDraft { priority: Some(Priority::High), ..TaskDraft::new("open") }).await;

        let stats = store.get_stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, stats.total - stats.completed);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 33);
    }
}
