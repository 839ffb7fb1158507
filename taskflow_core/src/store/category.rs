use std::collections::HashMap;

use thiserror::Error;

use crate::data::category::{CategoriesTable, Category, CategoryDraft, CategoryId, CategoryPatch};

use super::latency::Latency;

/// Error type for category store operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CategoryStoreError {
    /// No category in the store has the requested id.
    #[error("no category with id {0}")]
    NotFound(CategoryId),
}

/// Asynchronous access to the category collection, with the same latency and
/// copy semantics as [`TaskStore`](super::task::TaskStore).
#[derive(Debug)]
pub struct CategoryStore {
    table: CategoriesTable,
    latency: Latency,
}

impl CategoryStore {
    pub fn new(table: CategoriesTable, latency: Latency) -> Self {
        CategoryStore { table, latency }
    }

    /// Copies of all categories, sorted ascending by display position.
    pub async fn get_all(&self) -> Vec<Category> {
        self.latency.wait().await;
        let mut categories: Vec<Category> = self.table.iter().cloned().collect();
        categories.sort_by_key(|category| category.position);
        categories
    }

    pub async fn get_by_id(&self, id: CategoryId) -> Option<Category> {
        self.latency.wait().await;
        self.table.get(id).cloned()
    }

    pub async fn create(&mut self, draft: CategoryDraft) -> Category {
        self.latency.wait().await;
        let category = self.table.insert(draft).clone();
        tracing::debug!(id = %category.id, name = %category.name, "created category");
        category
    }

    pub async fn update(
        &mut self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, CategoryStoreError> {
        self.latency.wait().await;
        let category = self
            .table
            .apply_patch(id, patch)
            .ok_or(CategoryStoreError::NotFound(id))?
            .clone();
        tracing::debug!(id = %category.id, "updated category");
        Ok(category)
    }

    pub async fn delete(&mut self, id: CategoryId) -> Result<Category, CategoryStoreError> {
        self.latency.wait().await;
        let category = self.table.remove(id).ok_or(CategoryStoreError::NotFound(id))?;
        tracing::debug!(id = %category.id, "deleted category");
        Ok(category)
    }

    /// Full-collection recompute of the derived task counts: every
    /// category's count becomes the mapped value, 0 when its id is absent.
    /// Returns all updated copies in insertion order. The mapping must be
    /// derived from the complete current task set.
    pub async fn update_task_counts(
        &mut self,
        counts: &HashMap<CategoryId, u32>,
    ) -> Vec<Category> {
        self.latency.wait().await;
        self.table.set_task_counts(counts);
        self.table.iter().cloned().collect()
    }
}
