//! End-to-end tests for the control language driving the engine.
//!
//! Each test parses control lines exactly as the daemon reads them from
//! stdin and applies them to an engine wired to in-memory fakes, then feeds
//! adapter replies through the receive path.

use std::collections::VecDeque;
use std::path::Path;

use x10hub_adapter_control::parse_line;
use x10hub_app::ports::{
    ActionError, ActionOutcome, ActionRunner, EventLog, EventLogError, Transport, TransportError,
};
use x10hub_app::{ControlReply, Engine, EngineConfig};
use x10hub_domain::address::Address;
use x10hub_domain::event::EventRecord;
use x10hub_domain::state::DeviceState;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Adapter {
    online: bool,
    incoming: VecDeque<Vec<u8>>,
    written: Vec<String>,
}

impl Transport for Adapter {
    fn is_available(&self) -> bool {
        self.online
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let Some(chunk) = self.incoming.pop_front() else {
            return Ok(0);
        };
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        if !self.online {
            return Err(TransportError::Unavailable);
        }
        self.written.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(bytes.len())
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.online = true;
        Ok(())
    }
}

#[derive(Default)]
struct Runner {
    commands: Vec<String>,
}

impl ActionRunner for Runner {
    fn run(&mut self, command: &str) -> Result<ActionOutcome, ActionError> {
        self.commands.push(command.to_string());
        Ok(ActionOutcome { exit_code: Some(0) })
    }
}

#[derive(Default)]
struct Events {
    enabled: bool,
    lines: Vec<String>,
}

impl EventLog for Events {
    fn redirect(&mut self, path: Option<&Path>) {
        self.enabled = path.is_some();
    }

    fn append(&mut self, record: &EventRecord) -> Result<(), EventLogError> {
        if self.enabled {
            self.lines.push(record.to_string());
        }
        Ok(())
    }
}

type Hub = Engine<Adapter, Runner, Events>;

fn hub(online: bool) -> Hub {
    Engine::new(
        Adapter {
            online,
            ..Adapter::default()
        },
        Runner::default(),
        Events::default(),
        EngineConfig::default(),
    )
}

/// Apply every line, collecting report bodies.
fn feed(hub: &mut Hub, lines: &[&str]) -> Vec<String> {
    let mut reports = Vec::new();
    for line in lines {
        for op in parse_line(line).unwrap() {
            if let ControlReply::Report(report) = hub.apply(op).unwrap() {
                reports.push(report.body);
            }
        }
    }
    reports
}

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

// ---------------------------------------------------------------------------
// Online
// ---------------------------------------------------------------------------

#[test]
fn should_write_commands_and_verify_them_from_echoes() {
    let mut hub = hub(true);
    feed(&mut hub, &["A3 ON", "B12 OFF"]);

    assert_eq!(
        hub.transport().written,
        vec!["$>28001A03A03 AONAON81#", "$>28001B12B12 BOFFBOFF01#"]
    );
    assert_eq!(hub.queue().len(), 2);

    hub.receive(b"$<2800!A03ON4B#$<2800!B12OFF00#");

    assert!(hub.queue().is_empty());
    assert_eq!(hub.devices().state(addr("A3")), DeviceState::On);
    assert_eq!(hub.devices().state(addr("B12")), DeviceState::Off);
}

#[test]
fn should_run_trigger_for_power_line_event() {
    let mut hub = hub(true);
    feed(
        &mut hub,
        &["desc A3 Porch", "trigger A3 ON lamp %h %u %d", "always all log %h%u %f"],
    );

    hub.receive(b"$<2800!A03ON00#");
    hub.receive(b"$<2800!A03ON00#");

    // The repeat changes nothing, so only the wildcard rule answers it.
    assert_eq!(hub.runner().commands, vec!["lamp A 3 Porch", "log A3 ON"]);
}

#[test]
fn should_fall_back_to_wildcard_rule() {
    let mut hub = hub(true);
    feed(&mut hub, &["always all log %h%u %f"]);

    hub.receive(b"$<2800!C07DIM00#");
    hub.receive(b"$<2800!C07OFF00#");

    assert_eq!(hub.runner().commands, vec!["log C7 OFF"]);
}

#[test]
fn should_fire_wildcard_only_for_its_function() {
    let mut hub = hub(true);
    feed(&mut hub, &["always all OFF off-only %h%u"]);

    hub.receive(b"$<2800!A03ON00#");
    hub.receive(b"$<2800!A03OFF00#");

    assert_eq!(hub.runner().commands, vec!["off-only A3"]);
}

#[test]
fn should_mute_device_with_never_rule() {
    let mut hub = hub(true);
    feed(&mut hub, &["never A3", "trigger A3 ON lamp", "always all log"]);

    hub.receive(b"$<2800!A03ON00#");

    assert!(hub.runner().commands.is_empty());
    assert_eq!(hub.devices().state(addr("A3")), DeviceState::On);
}

#[test]
fn should_record_events_once_when_events_file_is_set() {
    let mut hub = hub(true);
    feed(&mut hub, &["events /tmp/x10.events", "desc A3 Porch"]);

    hub.receive(b"$<2800!A03ON00#");
    hub.receive(b"$<2800!A03ON00#");
    hub.receive(b"$<2800!A03OFF00#");

    let lines = &hub.event_log().lines;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Device Porch (A3) ON "));
    assert!(lines[1].starts_with("Device Porch (A3) OFF "));
}

#[test]
fn should_record_repeat_of_unlogged_event_once_events_file_is_set() {
    let mut hub = hub(true);
    hub.receive(b"$<2800!A03ON00#");
    feed(&mut hub, &["events /tmp/x10.events"]);
    hub.receive(b"$<2800!A03ON00#");

    let lines = &hub.event_log().lines;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Device A3 (A3) ON "));
}

#[test]
fn should_resynchronise_other_devices_on_reset_event() {
    let mut hub = hub(true);
    feed(&mut hub, &["reset P16 OFF"]);
    hub.receive(b"$<2800!A03ON00#");
    hub.receive(b"$<2800!B04OFF00#");
    assert!(hub.transport().written.is_empty());

    hub.receive(b"$<2800!P16OFF00#");

    let written = &hub.transport().written;
    assert_eq!(written.len(), 2);
    assert!(written[0].starts_with("$>28001A03A03 AONAON"));
    assert!(written[1].starts_with("$>28001B04B04 BOFFBOFF"));
}

// ---------------------------------------------------------------------------
// Offline
// ---------------------------------------------------------------------------

#[test]
fn should_echo_commands_locally_while_offline() {
    let mut hub = hub(false);
    feed(&mut hub, &["trigger A3 ON lamp", "A3 ON"]);

    assert!(hub.transport().written.is_empty());
    assert!(hub.queue().is_empty());
    assert_eq!(hub.devices().state(addr("A3")), DeviceState::On);
    assert_eq!(hub.runner().commands, vec!["lamp"]);
}

#[test]
fn should_forget_state_on_undefine() {
    let mut hub = hub(false);
    feed(&mut hub, &["A3 ON", "A3 UND"]);
    assert_eq!(hub.devices().state(addr("A3")), DeviceState::Unknown);
}

#[test]
fn should_go_online_after_reconnect() {
    let mut hub = hub(false);
    assert!(hub.try_reconnect());
    feed(&mut hub, &["A3 ON"]);
    assert_eq!(hub.transport().written.len(), 1);
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[test]
fn should_render_reloadable_dump() {
    let mut hub = hub(false);
    let reports = feed(
        &mut hub,
        &[
            "desc A3 Porch",
            "trigger A3 ON lamp on",
            "never B2",
            "always all log %h%u",
            "events /var/log/x10.events",
            "dump",
        ],
    );
    let dump = &reports[0];

    let mut restored = self::hub(false);
    let lines: Vec<&str> = dump.lines().collect();
    feed(&mut restored, &lines);

    assert_eq!(restored.render_state_dump(), *dump);
    assert_eq!(restored.triggers().len(), 3);
}

#[test]
fn should_render_status_for_known_devices() {
    let mut hub = hub(false);
    let reports = feed(&mut hub, &["desc B2 Hall", "A10 ON", "B2 OFF", "status"]);
    assert_eq!(reports, vec!["A10 On  \nHall Off \n"]);
}
