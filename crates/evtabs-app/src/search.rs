// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use crate::{CategorizedData, FavoritesRegistry, ListItem, get_content};

/// Case-insensitive matcher built from free-text search input.
///
/// Input that does not compile as a regular expression is matched as a
/// literal substring instead of failing.
#[derive(Debug, Clone)]
pub enum SearchMatcher {
    Compiled(Regex),
    Literal(String),
}

impl SearchMatcher {
    pub fn compile(query: &str) -> Self {
        match RegexBuilder::new(query).case_insensitive(true).build() {
            Ok(regex) => Self::Compiled(regex),
            Err(error) => {
                tracing::debug!(query, %error, "search pattern rejected; matching literally");
                Self::Literal(query.to_lowercase())
            }
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match self {
            Self::Compiled(regex) => regex.is_match(haystack),
            Self::Literal(needle) => haystack.to_lowercase().contains(needle.as_str()),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn pattern(&self) -> &str {
        match self {
            Self::Compiled(regex) => regex.as_str(),
            Self::Literal(needle) => needle,
        }
    }
}

impl Default for SearchMatcher {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl PartialEq for SearchMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.is_literal() == other.is_literal() && self.pattern() == other.pattern()
    }
}

/// Inserts a space before every capital letter, then trims.
pub fn format_key(key: &str) -> String {
    let mut formatted = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            formatted.push(' ');
        }
        formatted.push(ch);
    }
    formatted.trim().to_owned()
}

/// Narrows a category's content by search query and favorites.
///
/// Rows are deduplicated on `formatted key + ":" + value`. A selected
/// category with nothing left yields the single placeholder row; no
/// selected category yields nothing at all.
pub fn filter_items(
    category: Option<&str>,
    data: &CategorizedData,
    favorites: &FavoritesRegistry,
    query: &str,
    restrict_to_favorites: bool,
) -> Vec<ListItem> {
    filter_items_with(
        category,
        data,
        favorites,
        &SearchMatcher::compile(query),
        restrict_to_favorites,
    )
}

/// [`filter_items`] with an already compiled query.
pub fn filter_items_with(
    category: Option<&str>,
    data: &CategorizedData,
    favorites: &FavoritesRegistry,
    matcher: &SearchMatcher,
    restrict_to_favorites: bool,
) -> Vec<ListItem> {
    let Some(category) = category else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for item in get_content(category, data, favorites) {
        let formatted_key = format_key(&item.key);
        let value = item.value.as_text();
        if !matcher.is_match(&formatted_key) && !matcher.is_match(&value) {
            continue;
        }
        if restrict_to_favorites && !item.is_favorite {
            continue;
        }
        if seen.insert(format!("{formatted_key}:{value}")) {
            items.push(item);
        }
    }

    if items.is_empty() {
        items.push(ListItem::placeholder());
    }
    items
}
