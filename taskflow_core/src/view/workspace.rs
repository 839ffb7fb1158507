use chrono::{DateTime, Utc};

use crate::data::category::{Category, CategoryDraft, CategoryId};
use crate::data::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::query::{self, TaskFilter, TaskStats};
use crate::store::category::CategoryStore;
use crate::store::task::{TaskStore, TaskStoreError};

use super::optimistic::commit_or_revert;

/// The merged working state behind a task-list screen: local copies of both
/// collections plus derived statistics, kept in step with the backing
/// stores.
///
/// Mutations follow the stores' single-logical-caller model. Where the
/// screen wants instant feedback (toggling completion, deleting), the
/// workspace speculates on its local copy, commits through the store, and
/// reverts the speculation if the store refuses. After every task mutation
/// it re-derives statistics and pushes fresh per-category counts into the
/// category store.
#[derive(Debug)]
pub struct Workspace {
    task_store: TaskStore,
    category_store: CategoryStore,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    stats: TaskStats,
    filter: TaskFilter,
    active_category: Option<CategoryId>,
}

impl Workspace {
    /// Fetches both collections and the initial statistics.
    pub async fn load(task_store: TaskStore, category_store: CategoryStore) -> Self {
        let mut workspace = Workspace {
            task_store,
            category_store,
            tasks: Vec::new(),
            categories: Vec::new(),
            stats: TaskStats::default(),
            filter: TaskFilter::default(),
            active_category: None,
        };
        workspace.tasks = workspace.task_store.get_all().await;
        workspace.categories = workspace.category_store.get_all().await;
        workspace.stats = workspace.task_store.get_stats().await;
        workspace
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn stats(&self) -> TaskStats {
        self.stats
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn set_active_category(&mut self, category: Option<CategoryId>) {
        self.active_category = category;
    }

    /// Drops the filter (including its search text) and the active category
    /// at once.
    pub fn clear_filters(&mut self) {
        self.filter = TaskFilter::default();
        self.active_category = None;
    }

    /// The tasks the screen should show: narrowed to the active category,
    /// filtered, and in display order.
    pub fn display_tasks(&self, now: DateTime<Utc>) -> Vec<&Task> {
        let in_category = self.tasks.iter().filter(|task| {
            self.active_category.map_or(true, |category| task.category_id == category)
        });
        query::filter_and_sort(in_category, &self.filter, now)
    }

    /// Flips a task's completion state, showing the flip immediately and
    /// reverting it if the store refuses the update.
    pub async fn toggle_complete(&mut self, id: TaskId) -> Result<(), TaskStoreError> {
        let Some(current) = self.tasks.iter().find(|task| task.id == id).cloned() else {
            return Err(TaskStoreError::NotFound(id));
        };
        let completed = !current.completed;
        let patch = TaskPatch { completed: Some(completed), ..TaskPatch::default() };
        let confirmed = commit_or_revert(
            &mut self.tasks,
            |tasks| {
                if let Some(task) = tasks.iter_mut().find(|task| task.id == id) {
                    task.completed = completed;
                }
                Box::new(move |tasks: &mut Vec<Task>| {
                    if let Some(task) = tasks.iter_mut().find(|task| task.id == id) {
                        *task = current;
                    }
                })
            },
            self.task_store.update(id, patch),
        )
        .await?;
        self.reconcile(confirmed);
        self.refresh_derived().await;
        Ok(())
    }

    /// Creates a task and puts it at the top of the local list.
    pub async fn add_task(&mut self, draft: TaskDraft) -> TaskId {
        let task = self.task_store.create(draft).await;
        let id = task.id;
        self.tasks.insert(0, task);
        self.refresh_derived().await;
        id
    }

    /// Updates a task through the store and reconciles the confirmed record.
    pub async fn edit_task(&mut self, id: TaskId, patch: TaskPatch) -> Result<(), TaskStoreError> {
        let confirmed = self.task_store.update(id, patch).await?;
        self.reconcile(confirmed);
        self.refresh_derived().await;
        Ok(())
    }

    /// Removes a task, dropping it from the local list immediately and
    /// restoring it if the store refuses the deletion.
    pub async fn delete_task(&mut self, id: TaskId) -> Result<(), TaskStoreError> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Err(TaskStoreError::NotFound(id));
        };
        commit_or_revert(
            &mut self.tasks,
            |tasks| {
                let snapshot = tasks.remove(index);
                Box::new(move |tasks: &mut Vec<Task>| {
                    // the removal position is gone; restore newest-first order
                    tasks.push(snapshot);
                    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                })
            },
            self.task_store.delete(id),
        )
        .await?;
        self.refresh_derived().await;
        Ok(())
    }

    pub async fn add_category(&mut self, draft: CategoryDraft) -> CategoryId {
        let category = self.category_store.create(draft).await;
        let id = category.id;
        self.categories.push(category);
        id
    }

    fn reconcile(&mut self, confirmed: Task) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == confirmed.id) {
            *task = confirmed;
        }
    }

    // Re-derives statistics and per-category counts after a task mutation.
    // The counts mapping covers the complete local task set, so categories
    // that lost their last task drop back to zero.
    async fn refresh_derived(&mut self) {
        self.stats = self.task_store.get_stats().await;
        let counts = query::counts_by_category(&self.tasks);
        self.categories = self.category_store.update_task_counts(&counts).await;
        self.categories.sort_by_key(|category| category.position);
    }
}
