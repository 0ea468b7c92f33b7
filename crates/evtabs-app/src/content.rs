// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;

use crate::{CategorizedData, FavoritesRegistry, ListItem};

/// Display rows for one category: first occurrence of each key wins,
/// favorite status read from the registry at call time.
pub fn get_content(
    category: &str,
    data: &CategorizedData,
    favorites: &FavoritesRegistry,
) -> Vec<ListItem> {
    let Some(entries) = data.entries(category) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| seen.insert(entry.key.as_str()))
        .map(|entry| ListItem {
            key: entry.key.clone(),
            value: entry.value.clone(),
            is_favorite: favorites.contains(&entry.key),
        })
        .collect()
}
