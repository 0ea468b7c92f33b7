// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use time::macros::format_description;

use crate::{Event, EventTime, FieldValue, strip_category_prefix};

pub const DEFAULT_KEY_MAX_CHARS: usize = 60;
pub const DEFAULT_VALUE_MAX_CHARS: usize = 70;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub key_max_chars: usize,
    pub value_max_chars: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            key_max_chars: DEFAULT_KEY_MAX_CHARS,
            value_max_chars: DEFAULT_VALUE_MAX_CHARS,
        }
    }
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Human label for a field key: category prefix removed, words split on
/// capitals and underscores.
pub fn item_label(key: &str, max_chars: usize) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for ch in strip_category_prefix(key).chars() {
        if ch.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(ch);
    }

    let label = truncate_text(&spaced, max_chars).replace('_', " ");
    if label.is_empty() {
        key.to_owned()
    } else {
        label
    }
}

pub fn item_value(value: &FieldValue, max_chars: usize) -> String {
    truncate_text(&value.as_text(), max_chars)
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn format_clock(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| timestamp.to_string())
}

pub fn tab_label(event: &Event) -> String {
    match &event.timestamp {
        Some(EventTime::Parsed(timestamp)) => format_clock(*timestamp),
        Some(EventTime::Raw(raw)) => raw.clone(),
        None => format!("event {}", event.id.get() + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize, format_clock, item_label, item_value, tab_label, truncate_text};
    use crate::{Event, EventId, EventTime, FieldValue};
    use anyhow::Result;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly", 7), "exactly");
        assert_eq!(truncate_text("abcdefgh", 3), "abc...");
        assert_eq!(truncate_text("żółw-żółw", 4), "żółw...");
    }

    #[test]
    fn item_label_strips_prefix_and_splits_words() {
        assert_eq!(item_label("event_auth_userName", 60), "user Name");
        assert_eq!(item_label("event_net_src_ip", 60), "src ip");
        assert_eq!(item_label("hostname", 60), "hostname");
        assert_eq!(item_label("no data!", 60), "no data!");
        assert_eq!(item_label("event_auth_", 60), "event_auth_");
    }

    #[test]
    fn item_label_keeps_surrounding_whitespace() {
        assert_eq!(item_label("event_auth_UserName", 60), " User Name");
        assert_eq!(item_label("event_auth_user_", 60), "user ");
        assert_eq!(item_label("event_auth__", 60), " ");
    }

    #[test]
    fn item_label_truncates_before_replacing_underscores() {
        assert_eq!(item_label("event_auth_abc_def", 5), "abc d...");
    }

    #[test]
    fn item_value_truncates_display_text() {
        assert_eq!(item_value(&FieldValue::from("bob"), 70), "bob");
        assert_eq!(item_value(&FieldValue::from("x".repeat(80)), 70).len(), 73);
        assert_eq!(item_value(&FieldValue::from(12345), 3), "123...");
    }

    #[test]
    fn capitalize_uppercases_first_letter() {
        assert_eq!(capitalize("auth"), "Auth");
        assert_eq!(capitalize("netFlow"), "NetFlow");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn tab_labels_prefer_clock_time() -> Result<()> {
        let timestamp = OffsetDateTime::parse("2024-03-01T09:05:07+02:00", &Rfc3339)?;
        assert_eq!(format_clock(timestamp), "09:05:07");

        let mut event = Event::new(EventId::new(2), Vec::new());
        assert_eq!(tab_label(&event), "event 3");

        event.timestamp = Some(EventTime::Parsed(timestamp));
        assert_eq!(tab_label(&event), "09:05:07");

        event.timestamp = Some(EventTime::Raw("soon".to_owned()));
        assert_eq!(tab_label(&event), "soon");
        Ok(())
    }
}
