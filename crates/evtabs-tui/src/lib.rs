// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use evtabs_app::{
    Event, LOAD_FAILED_MESSAGE, LoadState, WidgetCommand, WidgetEvent,
    WidgetState, capitalize, item_label, item_value, tab_label,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const STAR_ON: &str = "★";
const STAR_OFF: &str = "☆";
const OPEN_MARK: &str = "▾";
const CLOSED_MARK: &str = "▸";
const CATEGORY_PANE_WIDTH: u16 = 26;

/// Supplies the event payload. `spawn_load` must send exactly one
/// [`InternalEvent::Loaded`] or [`InternalEvent::LoadFailed`].
pub trait AppRuntime {
    fn load_events(&mut self) -> Result<Vec<Event>>;
    fn spawn_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let event = match self.load_events() {
            Ok(events) => InternalEvent::Loaded(events),
            Err(error) => InternalEvent::LoadFailed(format!("{error:#}")),
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("load event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Loaded(Vec<Event>),
    LoadFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Categories,
    Items,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    focus: Focus,
    category_cursor: usize,
    item_cursor: usize,
    search_editing: bool,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut WidgetState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = runtime.spawn_load(internal_tx.clone()) {
        state.dispatch(WidgetCommand::LoadFailed(format!("{error:#}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            tracing::error!(%error, "draw failed");
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event
            && let TermEvent::Key(key) = event::read().context("read event")?
            && handle_key_event(state, &mut view_data, &internal_tx, key)
        {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut WidgetState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(WidgetCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Loaded(events) => {
                let emitted = state.dispatch(WidgetCommand::LoadSucceeded(events));
                follow_selection(state, view_data);
                if let Some(WidgetEvent::Loaded { events, categories }) = emitted.first() {
                    emit_status(
                        state,
                        view_data,
                        tx,
                        format!("loaded {events} events in {categories} categories"),
                    );
                }
            }
            InternalEvent::LoadFailed(error) => {
                state.dispatch(WidgetCommand::LoadFailed(error));
                *view_data = ViewData {
                    status_token: view_data.status_token,
                    ..ViewData::default()
                };
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut WidgetState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(WidgetCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event(
    state: &mut WidgetState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.search_editing {
        handle_search_key(state, view_data, key);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return true,
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        _ if !state.is_ready() => {}
        (KeyCode::Tab, _) | (KeyCode::Char('f'), KeyModifiers::NONE) => {
            state.dispatch(WidgetCommand::NextTab);
            follow_selection(state, view_data);
        }
        (KeyCode::BackTab, _) | (KeyCode::Char('b'), KeyModifiers::NONE) => {
            state.dispatch(WidgetCommand::PrevTab);
            follow_selection(state, view_data);
        }
        (KeyCode::Char('/'), _) => {
            view_data.search_editing = true;
            view_data.focus = Focus::Items;
        }
        (KeyCode::Char('F'), _) => {
            state.dispatch(WidgetCommand::ToggleShowFavorites);
            view_data.item_cursor = 0;
            schedule_clear_for_current_status(view_data, internal_tx);
        }
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => {
            view_data.focus = Focus::Categories;
        }
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => {
            view_data.focus = Focus::Items;
        }
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => move_cursor(state, view_data, 1),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => move_cursor(state, view_data, -1),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => move_cursor(state, view_data, isize::MIN),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => move_cursor(state, view_data, isize::MAX),
        (KeyCode::Enter, _) if view_data.focus == Focus::Categories => {
            toggle_category_at_cursor(state, view_data);
        }
        (KeyCode::Enter, _) | (KeyCode::Char(' '), _) | (KeyCode::Char('*'), _)
            if view_data.focus == Focus::Items =>
        {
            toggle_favorite_at_cursor(state, view_data, internal_tx);
        }
        _ => {}
    }
    false
}

fn handle_search_key(state: &mut WidgetState, view_data: &mut ViewData, key: KeyEvent) {
    let mut query = state.search_query.clone();
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Enter, _) => {
            view_data.search_editing = false;
            return;
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => query.clear(),
        (KeyCode::Backspace, _) => {
            query.pop();
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            query.push(ch);
        }
        _ => return,
    }

    if query != state.search_query {
        state.dispatch(WidgetCommand::InputChanged(query));
        view_data.item_cursor = 0;
    }
}

fn toggle_category_at_cursor(state: &mut WidgetState, view_data: &mut ViewData) {
    let Some(category) = state
        .data
        .category_names()
        .nth(view_data.category_cursor)
        .map(str::to_owned)
    else {
        return;
    };

    tracing::debug!(category = %category, "category toggled");
    state.dispatch(WidgetCommand::ToggleCategory(category));
    view_data.item_cursor = 0;
    if state.selected_category().is_some() {
        view_data.focus = Focus::Items;
    }
}

fn toggle_favorite_at_cursor(
    state: &mut WidgetState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let emitted = state.dispatch(WidgetCommand::ToggleFavorite(view_data.item_cursor));
    let Some(WidgetEvent::FavoriteChanged { key, favorite }) = emitted.into_iter().next() else {
        return;
    };

    let label = item_label(&key, state.display.key_max_chars);
    let message = if favorite {
        format!("favorite added: {label}")
    } else {
        format!("favorite removed: {label}")
    };
    emit_status(state, view_data, internal_tx, message);
}

fn schedule_clear_for_current_status(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn move_cursor(state: &WidgetState, view_data: &mut ViewData, delta: isize) {
    let focus = view_data.focus;
    let (cursor, len) = match focus {
        Focus::Categories => (&mut view_data.category_cursor, state.data.len()),
        Focus::Items => (&mut view_data.item_cursor, state.selected_content.len()),
    };
    if len == 0 {
        *cursor = 0;
        return;
    }
    let next = (*cursor as isize).saturating_add(delta);
    *cursor = next.clamp(0, len as isize - 1) as usize;
}

/// Points the category cursor at the selected category and resets the
/// item cursor.
fn follow_selection(state: &WidgetState, view_data: &mut ViewData) {
    if let Some(selected) = state.selected_category()
        && let Some(position) = state.data.category_names().position(|name| name == selected)
    {
        view_data.category_cursor = position;
    }
    view_data.category_cursor = view_data
        .category_cursor
        .min(state.data.len().saturating_sub(1));
    view_data.item_cursor = 0;
}

fn tab_titles(state: &WidgetState) -> Vec<String> {
    state
        .events
        .iter()
        .map(|event| format!(" {} ", tab_label(event)))
        .collect()
}

fn category_rows(state: &WidgetState) -> Vec<String> {
    state
        .data
        .iter()
        .map(|category| {
            let open = state.selected_category() == Some(category.name.as_str());
            let mark = if open { OPEN_MARK } else { CLOSED_MARK };
            format!(
                "{mark} {} ({})",
                capitalize(&category.name),
                category.entries.len()
            )
        })
        .collect()
}

fn item_rows(state: &WidgetState) -> Vec<[String; 3]> {
    state
        .selected_content
        .iter()
        .map(|item| {
            let star = if item.is_placeholder() {
                String::new()
            } else if item.is_favorite {
                STAR_ON.to_owned()
            } else {
                STAR_OFF.to_owned()
            };
            [
                star,
                item_label(&item.key, state.display.key_max_chars),
                item_value(&item.value, state.display.value_max_chars),
            ]
        })
        .collect()
}

fn search_line(state: &WidgetState, view_data: &ViewData) -> String {
    let cursor = if view_data.search_editing { "_" } else { "" };
    let mut line = format!("/{}{cursor}", state.search_query);
    if !state.search_query.is_empty() && state.search_matcher.is_literal() {
        line.push_str("  (literal match)");
    }
    if state.show_favorites {
        line.push_str(&format!("  {STAR_ON} favorites only"));
    }
    line
}

/// Text shown in place of the body when there is nothing to browse.
fn body_message(state: &WidgetState) -> Option<&'static str> {
    match &state.load {
        LoadState::Loading => Some("loading events..."),
        LoadState::Failed(_) => Some(LOAD_FAILED_MESSAGE),
        LoadState::Ready if state.data.is_empty() => Some("no categorized fields in payload"),
        LoadState::Ready => None,
    }
}

fn items_title(state: &WidgetState) -> String {
    match state.selected_category() {
        Some(category) => format!(
            "{} ({})",
            capitalize(category),
            state
                .selected_content
                .iter()
                .filter(|item| !item.is_placeholder())
                .count()
        ),
        None => "no category".to_owned(),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &WidgetState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let tabs = Tabs::new(tab_titles(state))
        .block(
            Block::default()
                .title(state.title.as_str())
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(state.selected_tab_index);
    frame.render_widget(tabs, layout[0]);

    let search_style = if view_data.search_editing {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search = Paragraph::new(search_line(state, view_data))
        .style(search_style)
        .block(Block::default().title("search").borders(Borders::ALL));
    frame.render_widget(search, layout[1]);

    if let Some(message) = body_message(state) {
        let style = if matches!(state.load, LoadState::Failed(_)) {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        let body = Paragraph::new(message)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(body, layout[2]);
    } else {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(CATEGORY_PANE_WIDTH), Constraint::Min(1)])
            .split(layout[2]);
        render_categories(frame, panes[0], state, view_data);
        render_items(frame, panes[1], state, view_data);
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_categories(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &WidgetState,
    view_data: &ViewData,
) {
    let focused = view_data.focus == Focus::Categories;
    let rows = category_rows(state)
        .into_iter()
        .enumerate()
        .map(|(index, label)| {
            let mut style = Style::default();
            if index == view_data.category_cursor {
                style = if focused {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    style.bg(Color::DarkGray)
                };
            }
            Row::new(vec![Cell::from(label)]).style(style)
        });

    let table = Table::new(rows, [Constraint::Min(8)]).block(
        Block::default()
            .title("categories")
            .borders(Borders::ALL)
            .border_style(pane_border(focused)),
    );
    frame.render_widget(table, area);
}

fn render_items(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &WidgetState,
    view_data: &ViewData,
) {
    let focused = view_data.focus == Focus::Items;
    let header = Row::new(vec![
        Cell::from(STAR_ON),
        Cell::from("field"),
        Cell::from("value"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows = item_rows(state)
        .into_iter()
        .enumerate()
        .map(|(index, cells)| {
            let mut style = Style::default();
            if index == view_data.item_cursor {
                style = if focused {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    style.bg(Color::DarkGray)
                };
            }
            Row::new(cells.into_iter().map(Cell::from).collect::<Vec<_>>()).style(style)
        });

    let widths = [
        Constraint::Length(2),
        Constraint::Percentage(40),
        Constraint::Min(8),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(items_title(state))
                .borders(Borders::ALL)
                .border_style(pane_border(focused)),
        );
    frame.render_widget(table, area);
}

fn pane_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn status_text(state: &WidgetState, view_data: &ViewData) -> String {
    let mode = if view_data.search_editing {
        "SEARCH"
    } else {
        "NAV"
    };
    let default = if view_data.search_editing {
        "type to filter | ctrl+u clear | enter/esc done".to_owned()
    } else {
        let favorites = if state.show_favorites { "on" } else { "off" };
        format!(
            "tab/f b tabs | h/l j/k | enter open | space fav | F favs:{favorites} | / search | ? help | q"
        )
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {default}"),
        None => format!("{mode} | {default}"),
    }
}

fn help_overlay_text() -> &'static str {
    "tab / f        next event tab\n\
     shift+tab / b  previous event tab\n\
     h / l          focus categories / fields\n\
     j / k          move down / up\n\
     g / G          first / last row\n\
     enter          open or close category (categories pane)\n\
     space / *      toggle favorite (fields pane)\n\
     F              show favorites only\n\
     /              search fields (regular expression, case-insensitive)\n\
     ?              toggle help\n\
     q / ctrl+q     quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
