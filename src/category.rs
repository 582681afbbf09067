//! Canonical classification targets.
//!
//! A [`CategorySet`] is loaded once per session and is immutable while
//! classification runs. Iteration order is the load order, which is also
//! the tie-break order wherever two categories score the same.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RubricatorError};

/// Stable identity of a category: an integer or a string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryId {
    Int(i64),
    Text(String),
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryId::Int(id) => write!(f, "{id}"),
            CategoryId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for CategoryId {
    fn from(id: i64) -> Self {
        CategoryId::Int(id)
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        CategoryId::Text(id.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(id: String) -> Self {
        CategoryId::Text(id)
    }
}

/// A canonical category.
///
/// The serde aliases accept the column names of the 2GIS category sheet
/// (`№`, `Тип`, `Общее описание`) so exported sheets load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "№")]
    pub id: CategoryId,
    #[serde(alias = "Тип")]
    pub name: String,
    #[serde(default, alias = "Общее описание")]
    pub description: String,
}

impl Category {
    pub fn new<I, N, D>(id: I, name: N, description: D) -> Self
    where
        I: Into<CategoryId>,
        N: Into<String>,
        D: Into<String>,
    {
        Category {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Text used to embed this category: `"{name}. {description}"`.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.name, self.description)
    }
}

/// Ordered, non-empty set of categories with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    /// Build a set, rejecting an empty list or duplicate ids.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        if categories.is_empty() {
            return Err(RubricatorError::invalid_input(
                "category set must not be empty",
            ));
        }

        let mut seen = HashSet::with_capacity(categories.len());
        for category in &categories {
            if !seen.insert(&category.id) {
                return Err(RubricatorError::invalid_input(format!(
                    "duplicate category id: {}",
                    category.id
                )));
            }
        }

        Ok(CategorySet { categories })
    }

    /// Parse a JSON array of categories.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let categories: Vec<Category> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    /// Load a JSON array of categories from a file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn get(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Category names in load order.
    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Embedding texts in load order.
    pub fn embedding_texts(&self) -> Vec<String> {
        self.categories.iter().map(Category::embedding_text).collect()
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.iter()
    }
}
