// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use crate::{Event, FieldEntry};

const FIELD_KEY_PREFIX: &str = "event_";

/// Extracts `<category>` from a key shaped like `event_<category>_<rest>`.
pub fn category_of(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(FIELD_KEY_PREFIX)?;
    let (category, _) = rest.split_once('_')?;
    if category.is_empty() {
        return None;
    }
    Some(category)
}

/// Returns the part of a field key after its `event_<category>_` prefix.
pub fn strip_category_prefix(key: &str) -> &str {
    match category_of(key) {
        Some(category) => &key[FIELD_KEY_PREFIX.len() + category.len() + 1..],
        None => key,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub entries: Vec<FieldEntry>,
}

/// Field entries grouped by category, in first-seen category order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedData {
    categories: Vec<Category>,
    positions: HashMap<String, usize>,
}

impl CategorizedData {
    pub fn categorize(events: &[Event]) -> Self {
        let mut data = Self::default();
        for event in events {
            for (key, value) in &event.raw_fields {
                let Some(category) = category_of(key) else {
                    continue;
                };
                data.push(
                    category,
                    FieldEntry {
                        key: key.clone(),
                        value: value.clone(),
                    },
                );
            }
        }
        data
    }

    pub fn push(&mut self, category: &str, entry: FieldEntry) {
        let position = match self.positions.get(category) {
            Some(position) => *position,
            None => {
                self.categories.push(Category {
                    name: category.to_owned(),
                    entries: Vec::new(),
                });
                let position = self.categories.len() - 1;
                self.positions.insert(category.to_owned(), position);
                position
            }
        };
        self.categories[position].entries.push(entry);
    }

    pub fn entries(&self, category: &str) -> Option<&[FieldEntry]> {
        self.positions
            .get(category)
            .map(|position| self.categories[*position].entries.as_slice())
    }

    pub fn first_category(&self) -> Option<&str> {
        self.categories.first().map(|category| category.name.as_str())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|category| category.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.positions.contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
