use thiserror::Error;

use super::category::{CategoriesTable, Category, CategoryId, DuplicateCategoryId};
use super::task::{DuplicateTaskId, Task, TasksTable};

/// The category that tasks created without one fall back to. The bundled
/// dataset reserves this id for its first category.
pub const FALLBACK_CATEGORY: CategoryId = CategoryId(1);

const BUNDLED_TASKS: &str = include_str!("../../fixtures/tasks.json");
const BUNDLED_CATEGORIES: &str = include_str!("../../fixtures/categories.json");

/// Initial data for both stores, parsed from JSON fixture documents: one
/// array of camelCase records per entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
}

/// Error type for loading fixture data.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("malformed fixture document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    DuplicateTask(#[from] DuplicateTaskId),
    #[error(transparent)]
    DuplicateCategory(#[from] DuplicateCategoryId),
}

impl Fixture {
    /// Parses a pair of fixture documents.
    pub fn from_json(tasks: &str, categories: &str) -> Result<Self, FixtureError> {
        Ok(Fixture {
            tasks: serde_json::from_str(tasks)?,
            categories: serde_json::from_str(categories)?,
        })
    }

    /// The dataset bundled with the crate.
    pub fn bundled() -> Self {
        Fixture::from_json(BUNDLED_TASKS, BUNDLED_CATEGORIES)
            .expect("bundled fixture documents should be well-formed")
    }

    /// Seeds freshly built tables with this fixture's records.
    pub fn seed(self) -> Result<(TasksTable, CategoriesTable), FixtureError> {
        let tasks = TasksTable::from_records(FALLBACK_CATEGORY, self.tasks)?;
        let categories = CategoriesTable::from_records(self.categories)?;
        Ok((tasks, categories))
    }
}
