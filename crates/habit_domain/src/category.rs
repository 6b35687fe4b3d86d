use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED_NAME: &str = "Uncategorized";
pub const UNCATEGORIZED_COLOR: &str = "#9ca3af";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
}

/// Display view of a habit's category. Missing and dangling references both
/// resolve to the uncategorized view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryView<'a> {
    pub id: Option<CategoryId>,
    pub name: &'a str,
    pub color: &'a str,
}

impl<'a> CategoryView<'a> {
    pub fn uncategorized() -> Self {
        Self {
            id: None,
            name: UNCATEGORIZED_NAME,
            color: UNCATEGORIZED_COLOR,
        }
    }
}

pub fn find_category(categories: &[Category], id: CategoryId) -> Option<&Category> {
    categories.iter().find(|category| category.id == id)
}

pub fn resolve_category(categories: &[Category], id: Option<CategoryId>) -> CategoryView<'_> {
    id.and_then(|id| find_category(categories, id))
        .map(|category| CategoryView {
            id: Some(category.id),
            name: &category.name,
            color: &category.color,
        })
        .unwrap_or_else(CategoryView::uncategorized)
}
