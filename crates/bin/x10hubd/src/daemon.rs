//! The event loop — the single owner of the engine.
//!
//! One `tokio::select!` multiplexes the adapter read tick, control lines on
//! stdin, the status poll, the read-request re-arm, reconnect attempts while
//! offline, and shutdown signals. Each branch runs to completion before the
//! next one is polled, so the engine never sees interleaved operations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{MissedTickBehavior, interval};
use x10hub_adapter_control::parse_line;
use x10hub_app::ports::{ActionRunner, EventLog, Transport};
use x10hub_app::{ControlReply, Engine, Report};

use crate::config::TimersConfig;

/// Run until a shutdown signal arrives, then save the state dump.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be installed.
pub async fn run<T, R, L>(engine: &mut Engine<T, R, L>, timers: &TimersConfig) -> anyhow::Result<()>
where
    T: Transport,
    R: ActionRunner,
    L: EventLog,
{
    let mut shutdown = Shutdown::install()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut read_tick = interval(timers.read_interval());
    let mut poll = interval(timers.status_poll());
    let mut rearm = interval(timers.read_request());
    let mut reconnect = interval(timers.reconnect());
    for timer in [&mut read_tick, &mut poll, &mut rearm, &mut reconnect] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    tracing::info!(online = engine.transport().is_available(), "x10hubd running");

    loop {
        tokio::select! {
            _ = read_tick.tick() => {
                engine.service_transport();
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => handle_line(engine, &line),
                Ok(None) => {
                    tracing::debug!("control input closed");
                    stdin_open = false;
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to read control input");
                    stdin_open = false;
                }
            },
            _ = poll.tick() => {
                if let Err(error) = engine.poll_status() {
                    tracing::warn!(%error, "status poll failed");
                }
            }
            _ = rearm.tick() => {
                if let Err(error) = engine.rearm_read_request() {
                    tracing::warn!(%error, "read request failed");
                }
            }
            _ = reconnect.tick(), if !engine.transport().is_available() => {
                engine.try_reconnect();
            }
            signal = shutdown.recv() => {
                tracing::info!(signal, "shutting down");
                break;
            }
        }
    }

    save_state(engine);
    Ok(())
}

/// Parse one control line and apply what it asks for.
///
/// A line that does not parse is logged and skipped as a whole.
pub fn handle_line<T, R, L>(engine: &mut Engine<T, R, L>, line: &str)
where
    T: Transport,
    R: ActionRunner,
    L: EventLog,
{
    let ops = match parse_line(line) {
        Ok(ops) => ops,
        Err(error) => {
            tracing::warn!(%error, line, "ignoring control line");
            return;
        }
    };
    for op in ops {
        match engine.apply(op) {
            Ok(ControlReply::Done) => {}
            Ok(ControlReply::Report(report)) => deliver(&report),
            Err(error) => tracing::warn!(%error, line, "control operation failed"),
        }
    }
}

/// Replay a commands file line by line. A missing file is not an error.
pub fn replay<T, R, L>(engine: &mut Engine<T, R, L>, path: &Path)
where
    T: Transport,
    R: ActionRunner,
    L: EventLog,
{
    match std::fs::read_to_string(path) {
        Ok(content) => {
            tracing::info!(path = %path.display(), "replaying commands file");
            for line in content.lines() {
                handle_line(engine, line);
            }
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no commands file yet");
        }
        Err(error) => {
            tracing::warn!(%error, path = %path.display(), "failed to read commands file");
        }
    }
}

/// Write the state dump to the commands file, or the log when none is set.
pub fn save_state<T, R, L>(engine: &Engine<T, R, L>)
where
    T: Transport,
    R: ActionRunner,
    L: EventLog,
{
    deliver(&Report {
        body: engine.render_state_dump(),
        destination: engine.commands_file().map(Path::to_path_buf),
        append: false,
    });
}

/// Send a report where it asked to go.
pub fn deliver(report: &Report) {
    let Some(path) = &report.destination else {
        for line in report.body.lines() {
            tracing::info!("{line}");
        }
        return;
    };
    if let Err(error) = write_report(path, &report.body, report.append) {
        tracing::warn!(%error, path = %path.display(), "failed to write report");
    }
}

fn write_report(path: &Path, body: &str, append: bool) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(body.as_bytes())?;
    file.flush()
}

/// Termination requests handled as a loop branch.
struct Shutdown {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
    #[cfg(unix)]
    quit: tokio::signal::unix::Signal,
}

impl Shutdown {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.hangup.recv() => "SIGHUP",
            _ = self.quit.recv() => "SIGQUIT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "SIGINT"
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use x10hub_app::EngineConfig;
    use x10hub_app::ports::{ActionError, ActionOutcome, NullTransport};
    use x10hub_domain::state::DeviceState;

    use super::*;
    use crate::events_file::FileEventLog;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Vec<String>,
    }

    impl ActionRunner for RecordingRunner {
        fn run(&mut self, command: &str) -> Result<ActionOutcome, ActionError> {
            self.commands.push(command.to_string());
            Ok(ActionOutcome { exit_code: Some(0) })
        }
    }

    type OfflineEngine = Engine<NullTransport, RecordingRunner, FileEventLog>;

    fn engine() -> OfflineEngine {
        Engine::new(
            NullTransport,
            RecordingRunner::default(),
            FileEventLog::new(),
            EngineConfig::default(),
        )
    }

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("x10hubd-{}-{name}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn should_apply_device_commands_offline() {
        let mut engine = engine();
        handle_line(&mut engine, "A3 ON B4 OFF");

        let a3 = "A3".parse().unwrap();
        let b4 = "B4".parse().unwrap();
        assert_eq!(engine.devices().state(a3), DeviceState::On);
        assert_eq!(engine.devices().state(b4), DeviceState::Off);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn should_skip_unparseable_line() {
        let mut engine = engine();
        handle_line(&mut engine, "A3 BLINK");
        handle_line(&mut engine, "trigger A3 ON lamp");
        assert_eq!(engine.triggers().len(), 1);
    }

    #[test]
    fn should_write_status_report_to_file() {
        let path = temp_path("status");
        let mut engine = engine();
        handle_line(&mut engine, "desc A3 Porch");
        handle_line(&mut engine, "A3 ON");
        handle_line(&mut engine, &format!("status {}", path.display()));
        handle_line(&mut engine, &format!("status {}", path.display()));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Porch On  \nPorch On  \n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn should_save_and_replay_state() {
        let path = temp_path("commands");
        let mut engine = engine();
        handle_line(&mut engine, "desc A3 Porch");
        handle_line(&mut engine, "trigger A3 ON lamp on");
        handle_line(&mut engine, "reset P16 OFF");
        handle_line(&mut engine, &format!("commands {}", path.display()));
        save_state(&engine);

        let mut restored = self::engine();
        replay(&mut restored, &path);

        assert_eq!(restored.render_state_dump(), engine.render_state_dump());
        assert_eq!(restored.commands_file(), Some(path.as_path()));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn should_ignore_missing_commands_file() {
        let mut engine = engine();
        replay(&mut engine, Path::new("/nonexistent/x10hub/commands"));
        assert!(engine.triggers().is_empty());
    }

    #[test]
    fn should_overwrite_dump_destination() {
        let path = temp_path("dump");
        std::fs::write(&path, "stale content that is longer than the dump\n").unwrap();

        deliver(&Report {
            body: "desc A3 Porch\n".to_string(),
            destination: Some(path.clone()),
            append: false,
        });

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "desc A3 Porch\n");
        std::fs::remove_file(&path).unwrap();
    }
}
