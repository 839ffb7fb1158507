use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A unique ID that can be used to refer to a category.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Color applied to categories created without one.
pub const DEFAULT_COLOR: &str = "#5B4CFF";

/// A named, colored grouping for tasks.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Hex color string used when rendering the category.
    pub color: String,
    /// Derived from the task collection via `set_task_counts`; never
    /// maintained incrementally.
    pub task_count: u32,
    /// Display ordering, ascending.
    pub position: u32,
}

/// Caller-supplied fields for a new category.
#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub color: Option<String>,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        CategoryDraft { name: name.into(), color: None }
    }
}

/// A shallow merge onto an existing category. `task_count` is excluded:
/// counts only change through `set_task_counts`.
#[derive(Debug, Default, Clone)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub position: Option<u32>,
}

/// A category id appeared more than once in seed records.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("duplicate category id {0}")]
pub struct DuplicateCategoryId(pub CategoryId);

/// Owns the category collection, in insertion order.
#[derive(Debug, Default)]
pub struct CategoriesTable {
    manifest: CategoriesManifest,
    categories: Vec<Category>,
}

#[derive(Debug)]
struct CategoriesManifest {
    /// The next ID to be assigned to a category.
    next_category_id: CategoryId,
}

impl Default for CategoriesManifest {
    fn default() -> Self {
        CategoriesManifest { next_category_id: CategoryId(1) }
    }
}

impl CategoriesTable {
    pub fn new() -> Self {
        CategoriesTable::default()
    }

    /// Seeds a table from existing records, resuming the id counter past the
    /// largest seeded id. Fails if two records share an id.
    pub fn from_records(records: Vec<Category>) -> Result<Self, DuplicateCategoryId> {
        let mut seen = HashSet::new();
        let mut next_category_id = CategoryId(1);
        for category in &records {
            if !seen.insert(category.id) {
                return Err(DuplicateCategoryId(category.id));
            }
            next_category_id =
                next_category_id.max(CategoryId(category.id.0.checked_add(1).unwrap()));
        }
        Ok(CategoriesTable {
            manifest: CategoriesManifest { next_category_id },
            categories: records,
        })
    }

    // Returns a unique `CategoryId` and marks that ID as used. Panics if the
    // ID space for this table is exhausted.
    fn gen_unique_category_id(&mut self) -> CategoryId {
        let id = self.manifest.next_category_id;
        self.manifest.next_category_id = CategoryId(id.0.checked_add(1).unwrap());
        id
    }

    // Positions are assigned past the largest surviving one, so a removal
    // can never make a later insert collide with an existing position.
    fn next_position(&self) -> u32 {
        self.categories.iter().map(|category| category.position).max().unwrap_or(0) + 1
    }

    /// Builds a category from the draft and appends it: fresh id, default
    /// color when unset, zero task count, next display position.
    pub fn insert(&mut self, draft: CategoryDraft) -> &Category {
        let id = self.gen_unique_category_id();
        let position = self.next_position();
        let category = Category {
            id,
            name: draft.name,
            color: draft.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
            task_count: 0,
            position,
        };
        self.categories.push(category);
        self.categories.last().expect("just pushed")
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Shallow-merges the patch onto the category with the given id. Returns
    /// `None` if there is no such category.
    pub fn apply_patch(&mut self, id: CategoryId, patch: CategoryPatch) -> Option<&Category> {
        let category = self.categories.iter_mut().find(|category| category.id == id)?;
        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(color) = patch.color {
            category.color = color;
        }
        if let Some(position) = patch.position {
            category.position = position;
        }
        Some(category)
    }

    pub fn remove(&mut self, id: CategoryId) -> Option<Category> {
        let index = self.categories.iter().position(|category| category.id == id)?;
        Some(self.categories.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Replaces every category's count with the mapped value, defaulting to
    /// 0 for ids absent from the mapping. The mapping must be derived from
    /// the complete current task set.
    pub fn set_task_counts(&mut self, counts: &HashMap<CategoryId, u32>) {
        for category in &mut self.categories {
            category.task_count = counts.get(&category.id).copied().unwrap_or(0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_applies_defaults() {
        let mut table = CategoriesTable::new();
        let category = table.insert(CategoryDraft::new("Personal")).clone();

        assert_eq!(category.id, CategoryId(1));
        assert_eq!(category.name, "Personal");
        assert_eq!(category.color, DEFAULT_COLOR);
        assert_eq!(category.task_count, 0);
        assert_eq!(category.position, 1);
        assert_eq!(table.get(category.id), Some(&category));
    }

    #[test]
    fn positions_never_collide_after_removal() {
        let mut table = CategoriesTable::new();
        let a = table.insert(CategoryDraft::new("a")).id;
        table.insert(CategoryDraft::new("b"));
        table.insert(CategoryDraft::new("c"));

        // removing the first category leaves positions 2 and 3 in place; the
        // next insert must land past them, not on 3 again
        table.remove(a).unwrap();
        let d = table.insert(CategoryDraft::new("d")).clone();
        assert_eq!(d.position, 4);
    }

    #[test]
    fn patch_merges_only_supplied_fields() {
        let mut table = CategoriesTable::new();
        let id = table.insert(CategoryDraft::new("Errands")).id;

        let patch = CategoryPatch { color: Some("#112233".to_owned()), ..CategoryPatch::default() };
        let category = table.apply_patch(id, patch).unwrap();
        assert_eq!(category.name, "Errands");
        assert_eq!(category.color, "#112233");
    }

    #[test]
    fn missing_ids_yield_none() {
        let mut table = CategoriesTable::new();
        assert_eq!(table.get(CategoryId(9)), None);
        assert!(table.apply_patch(CategoryId(9), CategoryPatch::default()).is_none());
        assert!(table.remove(CategoryId(9)).is_none());
    }

    #[test]
    fn set_task_counts_is_a_full_recompute() {
        let mut table = CategoriesTable::new();
        let x = table.insert(CategoryDraft::new("x")).id;
        let y = table.insert(CategoryDraft::new("y")).id;
        table.set_task_counts(&HashMap::from([(x, 5), (y, 2)]));

        // a later mapping that omits y zeroes it rather than keeping 2
        table.set_task_counts(&HashMap::from([(x, 3)]));
        assert_eq!(table.get(x).unwrap().task_count, 3);
        assert_eq!(table.get(y).unwrap().task_count, 0);
    }

    #[test]
    fn from_records_rejects_duplicate_ids() {
        let mut table = CategoriesTable::new();
        let category = table.insert(CategoryDraft::new("a")).clone();

        let result = CategoriesTable::from_records(vec![category.clone(), category]);
        assert_eq!(result.unwrap_err(), DuplicateCategoryId(CategoryId(1)));
    }
}
