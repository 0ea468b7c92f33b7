// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::ListItem;

/// Field keys the user has marked as favorite.
///
/// Favorites are keyed by field key, so every row sharing a key shares
/// its favorite status regardless of which event it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesRegistry {
    keys: BTreeSet<String>,
}

impl FavoritesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Flips `item.is_favorite` and records the new status under its key.
    /// Returns the post-toggle status.
    pub fn toggle(&mut self, item: &mut ListItem) -> bool {
        if item.is_favorite {
            self.keys.remove(&item.key);
        } else {
            self.keys.insert(item.key.clone());
        }
        item.is_favorite = !item.is_favorite;
        item.is_favorite
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
