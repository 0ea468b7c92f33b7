// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    CategorizedData, DisplayOptions, Event, FavoritesRegistry, ListItem, SearchMatcher,
    filter_items_with, get_content,
};

pub const DEFAULT_TITLE: &str = "Detect Multiple Failed Login";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    NoCategorySelected,
    CategorySelected(String),
}

impl Selection {
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::NoCategorySelected => None,
            Self::CategorySelected(category) => Some(category),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    pub title: String,
    pub display: DisplayOptions,
    pub load: LoadState,
    pub events: Vec<Event>,
    pub data: CategorizedData,
    pub selection: Selection,
    pub selected_tab_index: usize,
    pub search_query: String,
    /// `search_query` compiled once per input change.
    pub search_matcher: SearchMatcher,
    pub show_favorites: bool,
    pub selected_content: Vec<ListItem>,
    pub favorites: FavoritesRegistry,
    pub status_line: Option<String>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DisplayOptions::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    LoadSucceeded(Vec<Event>),
    LoadFailed(String),
    SelectTab(usize),
    NextTab,
    PrevTab,
    ToggleCategory(String),
    InputChanged(String),
    ToggleFavorite(usize),
    ToggleShowFavorites,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    Loaded { events: usize, categories: usize },
    LoadFailed(String),
    TabChanged(usize),
    CategoryChanged(Option<String>),
    ContentChanged(usize),
    SearchChanged(String),
    FavoriteChanged { key: String, favorite: bool },
    ShowFavoritesChanged(bool),
    StatusUpdated(String),
    StatusCleared,
}

impl WidgetState {
    pub fn new(title: impl Into<String>, display: DisplayOptions) -> Self {
        Self {
            title: title.into(),
            display,
            load: LoadState::Loading,
            events: Vec::new(),
            data: CategorizedData::default(),
            selection: Selection::NoCategorySelected,
            selected_tab_index: 0,
            search_query: String::new(),
            search_matcher: SearchMatcher::default(),
            show_favorites: false,
            selected_content: Vec::new(),
            favorites: FavoritesRegistry::new(),
            status_line: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.load == LoadState::Ready
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selection.category()
    }

    pub fn dispatch(&mut self, command: WidgetCommand) -> Vec<WidgetEvent> {
        match command {
            WidgetCommand::LoadSucceeded(events) => self.load_succeeded(events),
            WidgetCommand::LoadFailed(error) => self.load_failed(error),
            WidgetCommand::SetStatus(message) => vec![self.set_status(&message)],
            WidgetCommand::ClearStatus => {
                self.status_line = None;
                vec![WidgetEvent::StatusCleared]
            }
            _ if !self.is_ready() => Vec::new(),
            WidgetCommand::SelectTab(index) => self.select_tab(index),
            WidgetCommand::NextTab => self.rotate_tab(1),
            WidgetCommand::PrevTab => self.rotate_tab(-1),
            WidgetCommand::ToggleCategory(category) => self.toggle_category(category),
            WidgetCommand::InputChanged(text) => {
                self.search_matcher = SearchMatcher::compile(&text);
                self.search_query = text;
                self.refilter();
                vec![
                    WidgetEvent::SearchChanged(self.search_query.clone()),
                    WidgetEvent::ContentChanged(self.selected_content.len()),
                ]
            }
            WidgetCommand::ToggleFavorite(index) => self.toggle_favorite(index),
            WidgetCommand::ToggleShowFavorites => {
                self.show_favorites = !self.show_favorites;
                self.refilter();
                let label = if self.show_favorites {
                    "favorites only"
                } else {
                    "all fields"
                };
                vec![
                    WidgetEvent::ShowFavoritesChanged(self.show_favorites),
                    WidgetEvent::ContentChanged(self.selected_content.len()),
                    self.set_status(label),
                ]
            }
        }
    }

    fn load_succeeded(&mut self, events: Vec<Event>) -> Vec<WidgetEvent> {
        self.data = CategorizedData::categorize(&events);
        self.events = events;
        self.load = LoadState::Ready;
        self.selection = Selection::NoCategorySelected;
        self.selected_content.clear();
        tracing::info!(
            events = self.events.len(),
            categories = self.data.len(),
            "events categorized"
        );

        let mut emitted = vec![WidgetEvent::Loaded {
            events: self.events.len(),
            categories: self.data.len(),
        }];
        emitted.extend(self.select_tab(0));
        emitted
    }

    fn load_failed(&mut self, error: String) -> Vec<WidgetEvent> {
        tracing::warn!(%error, "event load failed");
        self.load = LoadState::Failed(error.clone());
        self.events.clear();
        self.data = CategorizedData::default();
        self.selection = Selection::NoCategorySelected;
        self.selected_content.clear();
        vec![
            WidgetEvent::LoadFailed(error.clone()),
            self.set_status(&format!("load failed: {error}")),
        ]
    }

    /// Records `index` for tab highlighting. The category shown is always
    /// the first one, whichever tab is chosen.
    fn select_tab(&mut self, index: usize) -> Vec<WidgetEvent> {
        self.selected_tab_index = index.min(self.events.len().saturating_sub(1));
        let mut emitted = vec![WidgetEvent::TabChanged(self.selected_tab_index)];

        if let Some(first) = self.data.first_category().map(str::to_owned) {
            self.selection = Selection::CategorySelected(first.clone());
            self.selected_content.clear();
            self.refilter();
            emitted.push(WidgetEvent::CategoryChanged(Some(first)));
            emitted.push(WidgetEvent::ContentChanged(self.selected_content.len()));
        }
        emitted
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<WidgetEvent> {
        let len = self.events.len() as isize;
        if len == 0 {
            return Vec::new();
        }
        let next = (self.selected_tab_index as isize + delta).rem_euclid(len) as usize;
        self.select_tab(next)
    }

    /// Opens `category` with unfiltered content, or closes it when it is
    /// already open. Favorites-only mode is switched off either way.
    fn toggle_category(&mut self, category: String) -> Vec<WidgetEvent> {
        let mut emitted = Vec::new();
        if self.show_favorites {
            self.show_favorites = false;
            emitted.push(WidgetEvent::ShowFavoritesChanged(false));
        }

        if self.selected_category() == Some(category.as_str()) {
            self.selection = Selection::NoCategorySelected;
            self.selected_content.clear();
            emitted.push(WidgetEvent::CategoryChanged(None));
        } else {
            self.selected_content = get_content(&category, &self.data, &self.favorites);
            self.selection = Selection::CategorySelected(category.clone());
            emitted.push(WidgetEvent::CategoryChanged(Some(category)));
        }
        emitted.push(WidgetEvent::ContentChanged(self.selected_content.len()));
        emitted
    }

    /// Flips one displayed row in place. Other rows sharing the key keep
    /// their stale status until the next filter pass.
    fn toggle_favorite(&mut self, index: usize) -> Vec<WidgetEvent> {
        let Some(item) = self.selected_content.get_mut(index) else {
            return Vec::new();
        };
        if item.is_placeholder() {
            return Vec::new();
        }

        let favorite = self.favorites.toggle(item);
        let key = item.key.clone();
        tracing::debug!(key = %key, favorite, "favorite toggled");
        vec![WidgetEvent::FavoriteChanged { key, favorite }]
    }

    fn refilter(&mut self) {
        self.selected_content = filter_items_with(
            self.selection.category(),
            &self.data,
            &self.favorites,
            &self.search_matcher,
            self.show_favorites,
        );
    }

    fn set_status(&mut self, message: &str) -> WidgetEvent {
        self.status_line = Some(message.to_owned());
        WidgetEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadState, Selection, WidgetCommand, WidgetEvent, WidgetState};
    use crate::{Event, EventId, FieldValue, ListItem};

    fn event(index: usize, fields: &[(&str, &str)]) -> Event {
        Event::new(
            EventId::new(index),
            fields
                .iter()
                .map(|(key, value)| ((*key).to_owned(), FieldValue::from(*value)))
                .collect(),
        )
    }

    fn loaded_state() -> WidgetState {
        let mut state = WidgetState::default();
        state.dispatch(WidgetCommand::LoadSucceeded(vec![
            event(
                0,
                &[
                    ("event_auth_user", "bob"),
                    ("event_net_src", "10.0.0.1"),
                    ("event_auth_result", "fail"),
                ],
            ),
            event(1, &[("event_auth_user", "alice"), ("event_net_dst", "10.0.0.9")]),
        ]));
        state
    }

    fn keys(state: &WidgetState) -> Vec<&str> {
        state
            .selected_content
            .iter()
            .map(|item| item.key.as_str())
            .collect()
    }

    #[test]
    fn state_starts_loading_and_ignores_user_commands() {
        let mut state = WidgetState::default();
        assert_eq!(state.load, LoadState::Loading);
        assert!(state.dispatch(WidgetCommand::ToggleCategory("auth".to_owned())).is_empty());
        assert!(state.dispatch(WidgetCommand::SelectTab(1)).is_empty());
        assert_eq!(state.selection, Selection::NoCategorySelected);
        assert!(state.selected_content.is_empty());
    }

    #[test]
    fn load_selects_first_category_through_the_filter() {
        let state = loaded_state();
        assert!(state.is_ready());
        assert_eq!(state.selected_category(), Some("auth"));
        assert_eq!(state.selected_tab_index, 0);
        assert_eq!(keys(&state), vec!["event_auth_user", "event_auth_result"]);
        assert_eq!(state.selected_content[0].value, FieldValue::from("bob"));
    }

    #[test]
    fn load_without_categories_leaves_nothing_selected() {
        let mut state = WidgetState::default();
        let events = state.dispatch(WidgetCommand::LoadSucceeded(vec![event(0, &[("host", "a")])]));
        assert_eq!(
            events,
            vec![
                WidgetEvent::Loaded {
                    events: 1,
                    categories: 0
                },
                WidgetEvent::TabChanged(0),
            ]
        );
        assert_eq!(state.selection, Selection::NoCategorySelected);
        assert!(state.selected_content.is_empty());
    }

    #[test]
    fn load_failure_sets_error_and_leaves_data_unset() {
        let mut state = WidgetState::default();
        let events = state.dispatch(WidgetCommand::LoadFailed("connection refused".to_owned()));
        assert_eq!(state.load, LoadState::Failed("connection refused".to_owned()));
        assert!(state.data.is_empty());
        assert_eq!(
            events[0],
            WidgetEvent::LoadFailed("connection refused".to_owned())
        );
        assert_eq!(
            state.status_line.as_deref(),
            Some("load failed: connection refused")
        );
    }

    #[test]
    fn select_tab_records_index_but_always_shows_first_category() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::ToggleCategory("net".to_owned()));
        assert_eq!(state.selected_category(), Some("net"));

        let events = state.dispatch(WidgetCommand::SelectTab(1));
        assert_eq!(state.selected_tab_index, 1);
        // Tab 1 is highlighted, but the category resets to the first one.
        assert_eq!(state.selected_category(), Some("auth"));
        assert_eq!(events[0], WidgetEvent::TabChanged(1));
    }

    #[test]
    fn select_tab_clamps_to_last_event() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::SelectTab(9));
        assert_eq!(state.selected_tab_index, 1);
    }

    #[test]
    fn tab_rotation_wraps() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::PrevTab);
        assert_eq!(state.selected_tab_index, 1);
        state.dispatch(WidgetCommand::NextTab);
        assert_eq!(state.selected_tab_index, 0);
    }

    #[test]
    fn toggle_category_opens_and_closes() {
        let mut state = loaded_state();

        state.dispatch(WidgetCommand::ToggleCategory("net".to_owned()));
        assert_eq!(state.selected_category(), Some("net"));
        assert_eq!(keys(&state), vec!["event_net_src", "event_net_dst"]);

        let events = state.dispatch(WidgetCommand::ToggleCategory("net".to_owned()));
        assert_eq!(state.selection, Selection::NoCategorySelected);
        assert!(state.selected_content.is_empty());
        assert_eq!(
            events,
            vec![
                WidgetEvent::CategoryChanged(None),
                WidgetEvent::ContentChanged(0)
            ]
        );
    }

    #[test]
    fn toggle_category_bypasses_search_and_placeholder() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::InputChanged("zzz".to_owned()));
        assert_eq!(state.selected_content, vec![ListItem::placeholder()]);

        state.dispatch(WidgetCommand::ToggleCategory("net".to_owned()));
        assert_eq!(keys(&state), vec!["event_net_src", "event_net_dst"]);

        state.dispatch(WidgetCommand::ToggleCategory("net".to_owned()));
        state.dispatch(WidgetCommand::ToggleCategory("missing".to_owned()));
        assert_eq!(state.selected_category(), Some("missing"));
        assert!(state.selected_content.is_empty());
    }

    #[test]
    fn toggle_category_switches_off_favorites_only() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::ToggleShowFavorites);
        assert!(state.show_favorites);

        let events = state.dispatch(WidgetCommand::ToggleCategory("net".to_owned()));
        assert!(!state.show_favorites);
        assert_eq!(events[0], WidgetEvent::ShowFavoritesChanged(false));
    }

    #[test]
    fn input_change_refilters_current_category() {
        let mut state = loaded_state();
        let events = state.dispatch(WidgetCommand::InputChanged("FAIL".to_owned()));
        assert_eq!(keys(&state), vec!["event_auth_result"]);
        assert_eq!(
            events,
            vec![
                WidgetEvent::SearchChanged("FAIL".to_owned()),
                WidgetEvent::ContentChanged(1)
            ]
        );
    }

    #[test]
    fn input_change_compiles_the_query_once() {
        let mut state = loaded_state();
        assert!(state.search_matcher.is_match("anything"));

        state.dispatch(WidgetCommand::InputChanged("(".to_owned()));
        assert!(state.search_matcher.is_literal());
        assert_eq!(state.selected_content, vec![ListItem::placeholder()]);

        state.dispatch(WidgetCommand::InputChanged("^b".to_owned()));
        assert!(!state.search_matcher.is_literal());
        assert_eq!(state.search_matcher.pattern(), "^b");
        assert_eq!(keys(&state), vec!["event_auth_user"]);

        // Tab changes reuse the stored matcher.
        state.dispatch(WidgetCommand::NextTab);
        assert_eq!(keys(&state), vec!["event_auth_user"]);
    }

    #[test]
    fn input_change_without_category_yields_nothing() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::ToggleCategory("auth".to_owned()));
        assert_eq!(state.selection, Selection::NoCategorySelected);

        state.dispatch(WidgetCommand::InputChanged("bob".to_owned()));
        assert!(state.selected_content.is_empty());
    }

    #[test]
    fn favorite_toggle_does_not_refilter() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::ToggleFavorite(0));
        state.dispatch(WidgetCommand::ToggleShowFavorites);
        assert_eq!(keys(&state), vec!["event_auth_user"]);

        let events = state.dispatch(WidgetCommand::ToggleFavorite(0));
        assert_eq!(
            events,
            vec![WidgetEvent::FavoriteChanged {
                key: "event_auth_user".to_owned(),
                favorite: false,
            }]
        );
        // Still visible until the next explicit filter pass.
        assert_eq!(keys(&state), vec!["event_auth_user"]);
        assert!(!state.selected_content[0].is_favorite);

        state.dispatch(WidgetCommand::InputChanged(String::new()));
        assert_eq!(state.selected_content, vec![ListItem::placeholder()]);
    }

    #[test]
    fn favorites_only_mode_applies_to_search() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::ToggleFavorite(1));
        state.dispatch(WidgetCommand::ToggleShowFavorites);
        state.dispatch(WidgetCommand::InputChanged("e".to_owned()));
        assert_eq!(keys(&state), vec!["event_auth_result"]);
    }

    #[test]
    fn favorite_toggle_ignores_placeholder_and_out_of_range_rows() {
        let mut state = loaded_state();
        assert!(state.dispatch(WidgetCommand::ToggleFavorite(99)).is_empty());

        state.dispatch(WidgetCommand::InputChanged("zzz".to_owned()));
        assert!(state.dispatch(WidgetCommand::ToggleFavorite(0)).is_empty());
        assert!(state.favorites.is_empty());
    }

    #[test]
    fn toggle_show_favorites_updates_status() {
        let mut state = loaded_state();
        let events = state.dispatch(WidgetCommand::ToggleShowFavorites);
        assert_eq!(
            events,
            vec![
                WidgetEvent::ShowFavoritesChanged(true),
                WidgetEvent::ContentChanged(1),
                WidgetEvent::StatusUpdated("favorites only".to_owned()),
            ]
        );
        assert_eq!(state.selected_content, vec![ListItem::placeholder()]);

        state.dispatch(WidgetCommand::ToggleShowFavorites);
        assert_eq!(state.status_line.as_deref(), Some("all fields"));
        assert_eq!(state.selected_content.len(), 2);
    }

    #[test]
    fn reload_replaces_data_but_keeps_favorites() {
        let mut state = loaded_state();
        state.dispatch(WidgetCommand::ToggleFavorite(0));

        state.dispatch(WidgetCommand::LoadSucceeded(vec![event(
            0,
            &[("event_dns_query", "example.com"), ("event_auth_user", "carol")],
        )]));
        assert_eq!(state.data.category_names().collect::<Vec<_>>(), vec!["dns", "auth"]);
        assert_eq!(state.selected_category(), Some("dns"));
        assert!(state.favorites.contains("event_auth_user"));
    }

    #[test]
    fn clear_status_resets_line() {
        let mut state = WidgetState::default();
        state.dispatch(WidgetCommand::SetStatus("hello".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("hello"));
        assert_eq!(
            state.dispatch(WidgetCommand::ClearStatus),
            vec![WidgetEvent::StatusCleared]
        );
        assert_eq!(state.status_line, None);
    }
}
