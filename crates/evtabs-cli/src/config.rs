// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use evtabs_app::{DEFAULT_TITLE, DisplayOptions};
use evtabs_loader::{DEFAULT_TIMEOUT, Source, parse_http_url};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const APP_NAME: &str = "evtabs";
const DEFAULT_LOG_LEVEL: &str = "info";

pub const CONFIG_PATH_ENV: &str = "EVTABS_CONFIG_PATH";
pub const DATA_ENV: &str = "EVTABS_DATA";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: SourceConfig::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub path: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub title: Option<String>,
    pub key_max_chars: Option<i64>,
    pub value_max_chars: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub path: Option<String>,
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [source], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `evtabs --print-example-config` for the current schema",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let (Some(_), Some(_)) = (&self.source.url, &self.source.path) {
            bail!(
                "source.url and source.path in {} are mutually exclusive; keep one",
                path.display()
            );
        }

        if let Some(url) = &self.source.url {
            parse_http_url(url).with_context(|| format!("source.url in {}", path.display()))?;
        }

        if let Some(timeout) = &self.source.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "source.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        for (name, value) in [
            ("ui.key_max_chars", self.ui.key_max_chars),
            ("ui.value_max_chars", self.ui.value_max_chars),
        ] {
            if let Some(value) = value
                && value <= 0
            {
                bail!(
                    "{name} in {} must be positive, got {value}",
                    path.display()
                );
            }
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!("log.level {level:?} in {} is not a valid filter", path.display())
            })?;
        }

        Ok(())
    }

    /// Resolves the data source: `--data`, then `[source]`, then `EVTABS_DATA`.
    pub fn source(&self, override_value: Option<&str>) -> Result<Option<Source>> {
        if let Some(raw) = override_value {
            return Source::parse(raw).map(Some);
        }
        if let Some(url) = &self.source.url {
            return Ok(Some(Source::Url(parse_http_url(url)?)));
        }
        if let Some(path) = &self.source.path {
            return Ok(Some(Source::File(PathBuf::from(path))));
        }
        match env::var(DATA_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Source::parse(&raw)
                .with_context(|| format!("invalid {DATA_ENV}"))
                .map(Some),
            _ => Ok(None),
        }
    }

    pub fn timeout(&self) -> Result<Duration> {
        match &self.source.timeout {
            Some(raw) => parse_duration(raw),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }

    pub fn title(&self) -> &str {
        self.ui.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn display_options(&self) -> DisplayOptions {
        let defaults = DisplayOptions::default();
        DisplayOptions {
            key_max_chars: positive_or(self.ui.key_max_chars, defaults.key_max_chars),
            value_max_chars: positive_or(self.ui.value_max_chars, defaults.value_max_chars),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path in the config file")
        })?;
        Ok(data_root.join(APP_NAME).join("evtabs.log"))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# evtabs config\n# Place this file at: {}\n\nversion = 1\n\n[source]\n# Set one of url or path, or pass --data / set {}.\n# url = \"https://alerts.example.com/api/events\"\n# path = \"/absolute/path/to/events.json\"\ntimeout = \"{}s\"\n\n[ui]\ntitle = \"{}\"\nkey_max_chars = {}\nvalue_max_chars = {}\n\n[log]\n# Optional. Default is platform data dir (for example ~/.local/share/evtabs/evtabs.log)\n# path = \"/absolute/path/to/evtabs.log\"\nlevel = \"{}\"\n",
            path.display(),
            DATA_ENV,
            DEFAULT_TIMEOUT.as_secs(),
            DEFAULT_TITLE,
            DisplayOptions::default().key_max_chars,
            DisplayOptions::default().value_max_chars,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn positive_or(value: Option<i64>, fallback: usize) -> usize {
    value
        .and_then(|value| usize::try_from(value).ok())
        .filter(|value| *value > 0)
        .unwrap_or(fallback)
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let parse = |value: &str| -> Result<u64> {
        value
            .trim()
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))
    };

    if let Some(value) = raw.strip_suffix("ms") {
        return Ok(Duration::from_millis(parse(value)?));
    }
    if let Some(value) = raw.strip_suffix('s') {
        return Ok(Duration::from_secs(parse(value)?));
    }
    if let Some(value) = raw.strip_suffix('m') {
        return Ok(Duration::from_secs(parse(value)?.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config, DATA_ENV, parse_duration};
    use anyhow::Result;
    use evtabs_loader::Source;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.title(), "Detect Multiple Failed Login");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.display_options().key_max_chars, 60);
        assert_eq!(config.display_options().value_max_chars, 70);
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[source]\npath = \"/tmp/events.json\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[source], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[source]\nurl = \"https://alerts.example.com/events\"\ntimeout = \"2s\"\n[ui]\ntitle = \"SSH brute force\"\nkey_max_chars = 20\n[log]\nlevel = \"debug\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.title(), "SSH brute force");
        assert_eq!(config.timeout()?, Duration::from_secs(2));
        assert_eq!(config.display_options().key_max_chars, 20);
        assert_eq!(config.display_options().value_max_chars, 70);
        assert_eq!(config.log_level(), "debug");
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn url_and_path_are_mutually_exclusive() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[source]\nurl = \"http://localhost/events\"\npath = \"/tmp/events.json\"\n",
        )?;
        let error = Config::load(&path).expect_err("both sources should fail");
        assert!(error.to_string().contains("mutually exclusive"));
        Ok(())
    }

    #[test]
    fn source_url_must_be_http() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[source]\nurl = \"ftp://host/events\"\n")?;
        let error = Config::load(&path).expect_err("ftp url should fail");
        assert!(format!("{error:#}").contains("unsupported scheme"));
        Ok(())
    }

    #[test]
    fn non_positive_limits_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[source]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));

        let (_temp, path) = write_config("version = 1\n[ui]\nvalue_max_chars = 0\n")?;
        let error = Config::load(&path).expect_err("zero width should fail");
        assert!(error.to_string().contains("ui.value_max_chars"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"evtabs=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("evtabs/config.toml"));
        Ok(())
    }

    #[test]
    fn data_flag_overrides_config_and_env() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n[source]\npath = \"/from/config.json\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(DATA_ENV, "/from/env.json");
        }
        let config = Config::load(&path)?;
        let from_flag = config.source(Some("https://flag.example/events"))?;
        let from_config = config.source(None)?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(DATA_ENV);
        }
        assert!(matches!(from_flag, Some(Source::Url(_))));
        assert_eq!(
            from_config,
            Some(Source::File(PathBuf::from("/from/config.json")))
        );
        Ok(())
    }

    #[test]
    fn data_env_is_used_when_config_has_no_source() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(DATA_ENV, "http://localhost:9200/events");
        }
        let config = Config::load(&path)?;
        let resolved = config.source(None)?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(DATA_ENV);
        }
        assert_eq!(
            resolved.map(|source| source.to_string()),
            Some("http://localhost:9200/events".to_owned())
        );
        Ok(())
    }

    #[test]
    fn missing_source_resolves_to_none() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(DATA_ENV);
        }
        assert_eq!(Config::default().source(None)?, None);
        Ok(())
    }

    #[test]
    fn log_path_defaults_to_data_dir() -> Result<()> {
        let config = Config::default();
        let resolved = config.log_path()?;
        assert!(
            resolved.ends_with("evtabs/evtabs.log"),
            "got {}",
            resolved.display()
        );

        let (_temp, path) = write_config("version = 1\n[log]\npath = \"/var/log/evtabs.log\"\n")?;
        assert_eq!(
            Config::load(&path)?.log_path()?,
            PathBuf::from("/var/log/evtabs.log")
        );
        Ok(())
    }

    #[test]
    fn timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn timeout_rejects_invalid_duration() {
        let error = parse_duration("oops").expect_err("invalid duration should fail");
        let message = error.to_string();
        assert!(
            message.contains("invalid duration") || message.contains("invalid timeout duration"),
            "unexpected message: {message}"
        );
    }

    #[test]
    fn example_config_loads_cleanly() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[source]"));
        assert!(example.contains("[ui]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.title(), "Detect Multiple Failed Login");
        Ok(())
    }
}
