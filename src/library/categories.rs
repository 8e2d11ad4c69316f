use std::collections::HashMap;

use crate::util::strip_control_chars;

/// Category names compare without regard to case.
pub fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// SEC-014: Sanitize and validate a category name.
///
/// Strips control characters, trims whitespace, and rejects empty names.
pub fn sanitize_category_name(name: &str) -> Option<String> {
    let cleaned = strip_control_chars(name);
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// A global category and how many feeds carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub refcount: usize,
    /// Display colour label from the config, if any.
    pub color: Option<String>,
}

/// Deduplicated, refcounted category names.
///
/// A name is present exactly while at least one feed carries it. The first
/// spelling seen is kept; later lookups ignore case. Colours are remembered
/// per name even while the category is absent, so a category that comes
/// back gets its colour back.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    colors: HashMap<String, String>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.categories
            .binary_search_by(|c| c.name.to_lowercase().cmp(&name.to_lowercase()))
    }

    /// Takes a reference on `name`, creating the category if needed.
    /// Returns the registry's spelling of the name.
    pub fn acquire(&mut self, name: &str) -> &str {
        let idx = match self.position(name) {
            Ok(idx) => {
                self.categories[idx].refcount += 1;
                idx
            }
            Err(idx) => {
                let color = self.colors.get(&name.to_lowercase()).cloned();
                self.categories.insert(
                    idx,
                    Category {
                        name: name.to_owned(),
                        refcount: 1,
                        color,
                    },
                );
                idx
            }
        };
        &self.categories[idx].name
    }

    /// Drops a reference on `name`. Returns `true` if that was the last one
    /// and the category is gone.
    pub fn release(&mut self, name: &str) -> bool {
        let Ok(idx) = self.position(name) else {
            tracing::warn!(category = %name, "Released a category that is not registered");
            return false;
        };
        let category = &mut self.categories[idx];
        category.refcount = category.refcount.saturating_sub(1);
        if category.refcount == 0 {
            self.categories.remove(idx);
            true
        } else {
            false
        }
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.position(name).ok().map(|idx| &self.categories[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_ok()
    }

    /// Categories in case-insensitive alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn set_color(&mut self, name: &str, color: impl Into<String>) {
        let color = color.into();
        if let Ok(idx) = self.position(name) {
            self.categories[idx].color = Some(color.clone());
        }
        self.colors.insert(name.to_lowercase(), color);
    }
}

/// Inserts `name` into a case-insensitively sorted list unless an equal
/// name is already there. Returns whether it was inserted.
pub(crate) fn insert_sorted(names: &mut Vec<String>, name: &str) -> bool {
    match names.binary_search_by(|n| n.to_lowercase().cmp(&name.to_lowercase())) {
        Ok(_) => false,
        Err(idx) => {
            names.insert(idx, name.to_owned());
            true
        }
    }
}

/// Removes `name` (any case) from the list, returning the stored spelling.
pub(crate) fn remove_name(names: &mut Vec<String>, name: &str) -> Option<String> {
    let idx = names.iter().position(|n| same_name(n, name))?;
    Some(names.remove(idx))
}
