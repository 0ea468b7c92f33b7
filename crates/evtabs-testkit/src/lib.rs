// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const USER_NAMES: [&str; 12] = [
    "avery", "jordan", "taylor", "riley", "morgan", "casey", "quinn", "parker", "drew", "kai",
    "robin", "rowan",
];

const AUTH_REASONS: [&str; 5] = [
    "bad password",
    "unknown user",
    "account locked",
    "expired token",
    "mfa timeout",
];

const AUTH_METHODS: [&str; 4] = ["password", "ssh-key", "kerberos", "saml"];
const PROTOCOLS: [&str; 4] = ["ssh", "rdp", "https", "smb"];
const COUNTRIES: [&str; 8] = ["US", "DE", "BR", "IN", "NL", "JP", "PL", "CA"];
const CITIES: [&str; 8] = [
    "Austin",
    "Berlin",
    "Recife",
    "Pune",
    "Utrecht",
    "Osaka",
    "Gdansk",
    "Halifax",
];
const HOST_NAMES: [&str; 6] = ["web-01", "web-02", "db-01", "bastion", "vpn-gw", "mail-01"];
const SOURCE_TYPES: [&str; 3] = ["syslog", "windows-security", "okta"];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Generates failed-login event payloads with a stable sequence per seed.
#[derive(Debug, Clone)]
pub struct EventFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl EventFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }

    /// One event object with a `Timestamp` and `_rawDataFields`.
    ///
    /// Besides categorized `event_<category>_<name>` fields, every event
    /// carries keys that fall outside the naming convention.
    pub fn failed_login_event(&mut self, index: usize) -> Value {
        let offset = Duration::seconds(index as i64 * 37 + self.rng.int_n(30) as i64);
        let timestamp = (reference_now() + offset)
            .format(&Rfc3339)
            .unwrap_or_else(|_| fixture_datetime().to_owned());

        let user = self.pick(&USER_NAMES);
        let result = if self.rng.int_n(6) == 0 {
            "success"
        } else {
            "fail"
        };
        let octets = [
            10,
            self.rng.int_n(256),
            self.rng.int_n(256),
            1 + self.rng.int_n(254),
        ];

        let mut fields = Map::new();
        fields.insert("event_auth_userName".to_owned(), json!(user));
        fields.insert("event_auth_result".to_owned(), json!(result));
        fields.insert("event_auth_reason".to_owned(), json!(self.pick(&AUTH_REASONS)));
        fields.insert("event_auth_method".to_owned(), json!(self.pick(&AUTH_METHODS)));
        fields.insert(
            "event_auth_attemptCount".to_owned(),
            json!(1 + self.rng.int_n(9)),
        );
        fields.insert(
            "event_net_srcIp".to_owned(),
            json!(format!(
                "{}.{}.{}.{}",
                octets[0], octets[1], octets[2], octets[3]
            )),
        );
        fields.insert(
            "event_net_srcPort".to_owned(),
            json!(1024 + self.rng.int_n(64_000)),
        );
        fields.insert("event_net_protocol".to_owned(), json!(self.pick(&PROTOCOLS)));
        let country = self.rng.int_n(COUNTRIES.len());
        fields.insert("event_geo_country".to_owned(), json!(COUNTRIES[country]));
        fields.insert("event_geo_city".to_owned(), json!(CITIES[country]));
        fields.insert("event_host_name".to_owned(), json!(self.pick(&HOST_NAMES)));
        fields.insert("event_host_isCritical".to_owned(), json!(self.rng.bool()));
        fields.insert("event_severity".to_owned(), json!("high"));
        fields.insert("sourceType".to_owned(), json!(self.pick(&SOURCE_TYPES)));

        json!({
            "Id": format!("evt-{:04}", index + 1),
            "Timestamp": timestamp,
            "_rawDataFields": Value::Object(fields),
        })
    }

    pub fn payload(&mut self, count: usize) -> Value {
        let events = (0..count)
            .map(|index| self.failed_login_event(index))
            .collect::<Vec<_>>();
        json!({ "Events": events })
    }
}

/// Builds a payload from literal `(key, value)` field lists, one per event.
pub fn payload_from_fields(events: &[&[(&str, Value)]]) -> Value {
    let events = events
        .iter()
        .map(|fields| {
            let raw = fields
                .iter()
                .map(|(key, value)| ((*key).to_owned(), value.clone()))
                .collect::<Map<_, _>>();
            json!({ "_rawDataFields": Value::Object(raw) })
        })
        .collect::<Vec<_>>();
    json!({ "Events": events })
}

/// The single failed-login event used throughout the scenario tests.
pub fn bob_failed_login() -> Value {
    payload_from_fields(&[&[
        ("event_auth_user", json!("bob")),
        ("event_auth_result", json!("fail")),
    ]])
}

pub fn write_payload(payload: &Value) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("events.json");
    let raw = serde_json::to_string_pretty(payload).context("encode payload")?;
    std::fs::write(&path, raw).with_context(|| format!("write payload {}", path.display()))?;
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-01-15T08:00:00Z"
}

fn reference_now() -> OffsetDateTime {
    match Date::from_calendar_date(REFERENCE_YEAR, Month::January, 15) {
        Ok(date) => date.with_time(Time::from_hms(8, 0, 0).unwrap_or(Time::MIDNIGHT)).assume_utc(),
        Err(_) => OffsetDateTime::UNIX_EPOCH,
    }
}
