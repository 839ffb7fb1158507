//! Presentation-facing filtering, display ordering, and aggregation over
//! task collections. Everything here is pure: the caller supplies the query
//! time.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::data::category::CategoryId;
use crate::data::task::{Priority, Task};

/// Completion-state filter choices.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum StatusFilter {
    Completed,
    Pending,
    Overdue,
}

/// A task-list filter. Unset fields don't constrain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring match on the title; empty means no
    /// constraint.
    pub search: String,
    pub priority: Option<Priority>,
    pub status: Option<StatusFilter>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.priority.is_none() && self.status.is_none()
    }

    fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if !self.search.is_empty()
            && !task.title.to_lowercase().contains(&self.search.to_lowercase())
        {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        match self.status {
            None => true,
            Some(StatusFilter::Completed) => task.completed,
            Some(StatusFilter::Pending) => !task.completed,
            Some(StatusFilter::Overdue) => task.is_overdue(now),
        }
    }
}

/// The display total order: incomplete before completed, then high before
/// medium before low priority, then tasks with a due date (ascending) before
/// tasks without one, then most recently created first.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| a.priority.display_rank().cmp(&b.priority.display_rank()))
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Applies the filter, then sorts for display. The sort is stable, so tasks
/// equal on every key keep their relative input order.
pub fn filter_and_sort<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    filter: &TaskFilter,
    now: DateTime<Utc>,
) -> Vec<&'a Task> {
    let mut filtered: Vec<&Task> =
        tasks.into_iter().filter(|task| filter.matches(task, now)).collect();
    filtered.sort_by(|a, b| display_order(a, b));
    filtered
}

/// Aggregate completion statistics over a task collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Percentage of tasks completed, rounded; 0 when there are no tasks.
    pub completion_rate: u32,
}

impl TaskStats {
    pub fn collect<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        let mut stats = TaskStats::default();
        for task in tasks {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            }
            if task.is_overdue(now) {
                stats.overdue += 1;
            }
        }
        stats.pending = stats.total - stats.completed;
        if stats.total > 0 {
            stats.completion_rate =
                ((stats.completed as f64 / stats.total as f64) * 100.0).round() as u32;
        }
        stats
    }
}

/// Tallies tasks per category into the complete mapping that
/// [`CategoryStore::update_task_counts`](crate::store::category::CategoryStore::update_task_counts)
/// expects.
pub fn counts_by_category(tasks: &[Task]) -> HashMap<CategoryId, u32> {
    let mut counts = HashMap::new();
    for task in tasks {
        *counts.entry(task.category_id).or_insert(0) += 1;
    }
    counts
}
