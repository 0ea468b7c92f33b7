// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use evtabs_app::{Event, events_from_payload};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the event payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    File(PathBuf),
}

impl Source {
    /// `http://` and `https://` values are URLs; anything else is a path.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("data source must not be empty; pass a JSON file path or an http(s) URL");
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(Self::Url(parse_http_url(trimmed)?));
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid data URL {raw:?}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("data URL {raw:?} uses unsupported scheme {other:?}; use http or https"),
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    url: Url,
    http: HttpClient,
}

impl Client {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = parse_http_url(url)?;
        if timeout.is_zero() {
            bail!("source.timeout must be positive");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { url, http })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn fetch_payload(&self) -> Result<Value> {
        let response = self
            .http
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|error| connection_error(self.url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body = response
            .text()
            .with_context(|| format!("read payload body from {}", self.url))?;
        tracing::info!(url = %self.url, bytes = body.len(), "payload fetched");
        serde_json::from_str(&body).with_context(|| format!("decode payload JSON from {}", self.url))
    }

    pub fn fetch_events(&self) -> Result<Vec<Event>> {
        let payload = self.fetch_payload()?;
        events_from_payload(&payload).with_context(|| format!("read events from {}", self.url))
    }
}

pub fn read_payload_file(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read payload file {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = raw.len(), "payload read");
    serde_json::from_str(&raw).with_context(|| format!("decode payload JSON {}", path.display()))
}

/// Resolves a [`Source`] into events, once.
#[derive(Debug, Clone)]
pub enum Loader {
    Http(Client),
    File(PathBuf),
}

impl Loader {
    pub fn new(source: &Source, timeout: Duration) -> Result<Self> {
        match source {
            Source::Url(url) => Ok(Self::Http(Client::new(url.as_str(), timeout)?)),
            Source::File(path) => Ok(Self::File(path.clone())),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Http(client) => client.url().to_owned(),
            Self::File(path) => path.display().to_string(),
        }
    }

    pub fn load_payload(&self) -> Result<Value> {
        match self {
            Self::Http(client) => client.fetch_payload(),
            Self::File(path) => read_payload_file(path),
        }
    }

    pub fn load_events(&self) -> Result<Vec<Event>> {
        let payload = self.load_payload()?;
        let events = events_from_payload(&payload)
            .with_context(|| format!("read events from {}", self.describe()))?;
        tracing::info!(source = %self.describe(), events = events.len(), "events ingested");
        Ok(events)
    }
}

fn connection_error(url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("timed out fetching {url} -- raise [source].timeout or check the server");
    }
    anyhow!("cannot reach {url} -- check [source].url and that the server is running ({error})")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Text(String),
    Detail { message: String },
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = match parsed.error {
            Some(ErrorBody::Text(text)) => Some(text),
            Some(ErrorBody::Detail { message }) => Some(message),
            None => parsed.message,
        };
        if let Some(message) = message
            && !message.is_empty()
        {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}
