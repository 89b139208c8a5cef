//! # x10hubd — x10hub daemon
//!
//! Composition root that wires the adapters to the TI103 engine and runs
//! the event loop.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars, optional commands file
//!   as the first argument)
//! - Initialise tracing
//! - Construct the serial transport, shell runner and events log (adapters)
//! - Construct the engine, injecting the adapters via port traits
//! - Replay the commands file, then serve stdin and the adapter
//! - Handle graceful shutdown (SIGINT/SIGTERM/SIGHUP/SIGQUIT) with a
//!   best-effort state dump
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no protocol logic belongs here.

mod config;
mod daemon;
mod events_file;
mod runner;

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use x10hub_adapter_serial::SerialTransport;
use x10hub_app::Engine;

use crate::config::Config;
use crate::events_file::FileEventLog;
use crate::runner::ShellActionRunner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Adapters
    let transport = SerialTransport::open(config.serial.clone());
    let runner = ShellActionRunner::new(config.files.shell.clone());
    let events = FileEventLog::new();

    let mut engine = Engine::new(transport, runner, events, config.engine_config());

    if let Some(path) = &config.files.events {
        engine.set_events_file(Some(path.clone()));
    }

    // The commands file may itself change the setting, so set it first.
    let commands = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.files.commands.clone());
    if let Some(path) = commands {
        engine.set_commands_file(Some(path.clone()));
        daemon::replay(&mut engine, &path);
    }

    daemon::run(&mut engine, &config.timers)
        .await
        .context("event loop failed")
}
