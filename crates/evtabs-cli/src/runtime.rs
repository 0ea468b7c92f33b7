// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use evtabs_app::{Event, events_from_payload};
use evtabs_loader::Loader;
use evtabs_testkit::EventFaker;
use evtabs_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;

pub const DEMO_SEED: u64 = 7;
pub const DEMO_EVENTS: usize = 6;

#[derive(Debug, Clone)]
pub enum LoaderRuntime {
    Source(Loader),
    Demo { seed: u64, events: usize },
}

impl LoaderRuntime {
    pub fn new(loader: Loader) -> Self {
        Self::Source(loader)
    }

    pub fn demo() -> Self {
        Self::Demo {
            seed: DEMO_SEED,
            events: DEMO_EVENTS,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Source(loader) => loader.describe(),
            Self::Demo { seed, events } => format!("demo payload (seed {seed}, {events} events)"),
        }
    }
}

impl evtabs_tui::AppRuntime for LoaderRuntime {
    fn load_events(&mut self) -> Result<Vec<Event>> {
        match self {
            Self::Source(loader) => loader.load_events(),
            Self::Demo { seed, events } => {
                events_from_payload(&EventFaker::new(*seed).payload(*events))
            }
        }
    }

    /// Loads on a worker thread so the first frame renders immediately.
    fn spawn_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let mut runtime = self.clone();
        thread::Builder::new()
            .name("evtabs-load".to_owned())
            .spawn(move || {
                let source = runtime.describe();
                let event = match runtime.load_events() {
                    Ok(events) => InternalEvent::Loaded(events),
                    Err(error) => {
                        tracing::error!(%source, error = %format!("{error:#}"), "load failed");
                        InternalEvent::LoadFailed(format!("{error:#}"))
                    }
                };
                let _ = tx.send(event);
            })
            .context("spawn load thread")?;
        Ok(())
    }
}
