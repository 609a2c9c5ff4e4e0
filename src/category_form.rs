//! Category creation form.
//!
//! The thumbnail is an already uploaded image URL; uploading is left to the
//! relay.

use serde::{Deserialize, Serialize};

use crate::backend::CatalogBackend;
use crate::error::{AdminError, Result};
use crate::fields::{Field, FieldCheckSet, check_fields};

/// Body of `POST /category`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCategory {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    draft: CreateCategory,
    checks: FieldCheckSet,
}

impl CategoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &CreateCategory {
        &self.draft
    }

    pub fn checks(&self) -> &FieldCheckSet {
        &self.checks
    }

    /// Update a text field and clear its check. Returns false for an unknown name.
    pub fn change_value(&mut self, name: &str, value: &str) -> bool {
        match name {
            "title" => self.draft.title = value.to_string(),
            "description" => self.draft.description = value.to_string(),
            "thumbnail" => self.draft.thumbnail = value.to_string(),
            _ => return false,
        }
        self.checks.remove(name);
        true
    }

    /// Replace the filter names, dropping blanks and repeats.
    pub fn set_filters(&mut self, filters: Vec<String>) {
        let mut kept: Vec<String> = Vec::with_capacity(filters.len());
        for filter in filters {
            let filter = filter.trim();
            if !filter.is_empty() && !kept.iter().any(|f| f == filter) {
                kept.push(filter.to_string());
            }
        }
        self.draft.filters = kept;
    }

    pub fn validate(&mut self) -> Result<()> {
        self.checks = check_fields(&[
            Field::new("title", self.draft.title.as_str()),
            Field::new("description", self.draft.description.as_str()),
        ]);
        if self.checks.is_empty() {
            return Ok(());
        }
        Err(AdminError::Validation {
            fields: self.checks.names().to_vec(),
        })
    }

    /// Validate and create the category.
    pub async fn submit<B>(&mut self, backend: &B) -> Result<()>
    where
        B: CatalogBackend + ?Sized,
    {
        self.validate()?;
        backend.create_category(&self.draft).await
    }
}

impl From<CreateCategory> for CategoryForm {
    fn from(mut draft: CreateCategory) -> Self {
        let filters = std::mem::take(&mut draft.filters);
        let mut form = CategoryForm {
            draft,
            checks: FieldCheckSet::new(),
        };
        form.set_filters(filters);
        form
    }
}
