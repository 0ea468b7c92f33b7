// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::{Config, DATA_ENV};
use evtabs_app::{CategorizedData, Event, FavoritesRegistry, WidgetState, get_content};
use evtabs_loader::Loader;
use evtabs_tui::AppRuntime;
use runtime::LoaderRuntime;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "EVTABS_LOG";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `evtabs --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    match init_logging(&config) {
        Ok(()) => {}
        Err(error) if config.log.path.is_none() => {
            eprintln!("logging disabled: {error:#}");
        }
        Err(error) => return Err(error),
    }

    let mut runtime = if options.demo {
        LoaderRuntime::demo()
    } else {
        let source = config.source(options.data.as_deref())?.ok_or_else(|| {
            anyhow!(
                "no data source; pass --data <path-or-url>, set [source].url or [source].path in {}, or set {DATA_ENV}",
                options.config_path.display()
            )
        })?;
        let loader = Loader::new(&source, config.timeout()?).with_context(|| {
            format!(
                "invalid [source] config in {}; fix url/path/timeout values",
                options.config_path.display()
            )
        })?;
        LoaderRuntime::new(loader)
    };
    tracing::info!(source = %runtime.describe(), "starting");

    if options.check_only {
        let events = runtime.load_events()?;
        for line in check_report(&events) {
            println!("{line}");
        }
        return Ok(());
    }

    let mut state = WidgetState::new(config.title(), config.display_options());
    evtabs_tui::run_app(&mut state, &mut runtime)
}

/// Logs go to a file because the terminal belongs to the TUI.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {} -- set [log].path", path.display()))?;

    let filter = match env::var(LOG_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            EnvFilter::try_new(&raw).with_context(|| format!("invalid {LOG_ENV} filter {raw:?}"))?
        }
        _ => EnvFilter::try_new(config.log_level())
            .with_context(|| format!("invalid log.level {:?}", config.log_level()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

/// One `<category>\t<distinct keys>\t<entries>` line per category.
fn check_report(events: &[Event]) -> Vec<String> {
    let data = CategorizedData::categorize(events);
    let favorites = FavoritesRegistry::new();
    data.iter()
        .map(|category| {
            let distinct = get_content(&category.name, &data, &favorites).len();
            format!("{}\t{}\t{}", category.name, distinct, category.entries.len())
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data: Option<String>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--data" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--data requires a JSON file path or http(s) URL"))?;
                options.data = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("evtabs - browse categorized alert event fields");
    println!("  --config <path>          Use a specific config path");
    println!("  --data <path-or-url>     Load events from a JSON file or http(s) URL");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with a generated failed-login payload");
    println!("  --check                  Load and categorize, print a summary, exit");
    println!("  --help                   Show this help");
}
