//! Engine — owns the protocol state and wires the components together.
//!
//! ```text
//! control op ─► encode ─► Transport::write ─► VerificationQueue::push
//! Transport::read ─► FrameAssembler ─► Decoder ─► handle_event
//!     handle_event: events log ─► verification ─► device table ─► triggers
//! ```
//!
//! While the transport is unavailable every written command is echoed
//! locally through the receive path, so state, verification and triggers
//! behave as they would with the adapter attached.

use std::path::{Path, PathBuf};

use x10hub_domain::action::{ActionTemplate, DEFAULT_ACTION_CAPACITY, Substitution};
use x10hub_domain::address::Address;
use x10hub_domain::event::{DeviceEvent, EventRecord};
use x10hub_domain::function::Function;
use x10hub_domain::time;
use x10hub_domain::trigger::{FiringClass, FunctionMatch, TriggerScope};

use crate::codec::{self, Decoder, STATUS_POLL};
use crate::control::{ControlOp, ControlReply, Report};
use crate::device_table::DeviceTable;
use crate::frame::{DEFAULT_FRAME_CAPACITY, Frame, FrameAssembler, FrameStats};
use crate::ports::{ActionRunner, EventLog, Transport, TransportError};
use crate::reset::ResetCoordinator;
use crate::trigger_engine::{Resolution, RuleChange, TriggerSet};
use crate::verification::{DEFAULT_QUEUE_CAPACITY, MatchOutcome, PushOutcome, VerificationQueue};

const READ_CHUNK: usize = 128;

/// Errors surfaced to the caller of an engine operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("short write to adapter: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("transport error")]
    Transport(#[from] TransportError),
}

/// Sizes of the engine's bounded buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub queue_capacity: usize,
    pub frame_capacity: usize,
    pub action_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            action_capacity: DEFAULT_ACTION_CAPACITY,
        }
    }
}

/// File settings that survive in the state dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Settings {
    events_file: Option<PathBuf>,
    commands_file: Option<PathBuf>,
}

/// The protocol engine.
pub struct Engine<T, R, L> {
    transport: T,
    runner: R,
    events: L,
    assembler: FrameAssembler,
    decoder: Decoder,
    devices: DeviceTable,
    queue: VerificationQueue,
    triggers: TriggerSet,
    coordinator: ResetCoordinator,
    settings: Settings,
    action_capacity: usize,
    read_waiting: bool,
}

impl<T, R, L> Engine<T, R, L>
where
    T: Transport,
    R: ActionRunner,
    L: EventLog,
{
    pub fn new(transport: T, runner: R, events: L, config: EngineConfig) -> Self {
        Self {
            transport,
            runner,
            events,
            assembler: FrameAssembler::new(config.frame_capacity),
            decoder: Decoder::new(),
            devices: DeviceTable::new(),
            queue: VerificationQueue::new(config.queue_capacity),
            triggers: TriggerSet::new(),
            coordinator: ResetCoordinator::new(),
            settings: Settings::default(),
            action_capacity: config.action_capacity,
            read_waiting: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn event_log(&self) -> &L {
        &self.events
    }

    pub fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    pub fn queue(&self) -> &VerificationQueue {
        &self.queue
    }

    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.assembler.stats()
    }

    /// Completed reset runs, for diagnostics.
    pub fn reset_runs(&self) -> u64 {
        self.coordinator.completed_runs()
    }

    /// Whether a status poll is still waiting for a reply.
    pub fn read_waiting(&self) -> bool {
        self.read_waiting
    }

    // ── Control operations ────────────────────────────────────────

    /// Apply one control operation.
    ///
    /// # Errors
    ///
    /// Only [`ControlOp::SendCommand`] can fail, see [`Self::send_command`].
    pub fn apply(&mut self, op: ControlOp) -> Result<ControlReply, EngineError> {
        match op {
            ControlOp::SendCommand { address, function } => {
                self.send_command(address, function)?;
            }
            ControlOp::AddOrReplaceTrigger {
                scope,
                function,
                class,
                action,
            } => {
                self.add_or_replace_trigger(scope, function, class, action);
            }
            ControlOp::AddOrReplaceDescription { address, text } => {
                self.add_or_replace_description(address, &text);
            }
            ControlOp::UndefineState { address } => self.undefine_state(address),
            ControlOp::SetEventsFile(path) => self.set_events_file(path),
            ControlOp::SetCommandsFile(path) => self.set_commands_file(path),
            ControlOp::RenderStateDump { path } => {
                tracing::info!("{}", self.queue.snapshot());
                let stats = self.frame_stats();
                tracing::info!(
                    frames = stats.frames,
                    malformed = stats.malformed,
                    overflows = stats.overflows,
                    "frame assembler counters"
                );
                return Ok(ControlReply::Report(Report {
                    body: self.render_state_dump(),
                    destination: path,
                    append: false,
                }));
            }
            ControlOp::RenderStatus {
                use_descriptions,
                path,
            } => {
                return Ok(ControlReply::Report(Report {
                    body: self.render_status(use_descriptions),
                    destination: path,
                    append: true,
                }));
            }
            ControlOp::Reinitialize => self.reinitialize(),
        }
        Ok(ControlReply::Done)
    }

    /// Encode and write a command, then track it for verification.
    ///
    /// Offline, the command is queued and echoed locally instead.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ShortWrite`] when the adapter accepted only
    /// part of the frame, or [`EngineError::Transport`] when the write
    /// failed. In both cases nothing is queued.
    pub fn send_command(&mut self, address: Address, function: Function) -> Result<(), EngineError> {
        let frame = codec::encode(address, function);
        tracing::info!(%address, %function, command = %String::from_utf8_lossy(&frame), "writing command");

        if !self.transport.is_available() {
            self.enqueue(address, function);
            self.receive(&codec::local_echo(address, function));
            return Ok(());
        }

        let written = self.transport.write(&frame)?;
        if written != frame.len() {
            tracing::warn!(written, expected = frame.len(), %address, %function, "short write to adapter");
            return Err(EngineError::ShortWrite {
                written,
                expected: frame.len(),
            });
        }
        self.enqueue(address, function);
        Ok(())
    }

    pub fn add_or_replace_trigger(
        &mut self,
        scope: TriggerScope,
        function: FunctionMatch,
        class: FiringClass,
        action: Option<ActionTemplate>,
    ) -> RuleChange {
        self.triggers.add_or_replace(scope, function, class, action)
    }

    pub fn add_or_replace_description(&mut self, address: Address, text: &str) {
        self.devices.set_description(address, text);
        tracing::info!(%address, description = text.trim(), "description updated");
    }

    pub fn undefine_state(&mut self, address: Address) {
        let previous = self.devices.set_unknown(address);
        tracing::info!(%address, %previous, "device state undefined");
    }

    /// Control-language text that rebuilds descriptions, triggers and file
    /// settings when replayed.
    pub fn render_state_dump(&self) -> String {
        let mut lines: Vec<String> = self
            .devices
            .descriptions()
            .map(|(address, text)| format!("desc {address} {text}"))
            .collect();
        lines.extend(self.triggers.rules().map(ToString::to_string));
        if let Some(path) = &self.settings.events_file {
            lines.push(format!("events {}", path.display()));
        }
        if let Some(path) = &self.settings.commands_file {
            lines.push(format!("commands {}", path.display()));
        }

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    pub fn render_status(&self, use_descriptions: bool) -> String {
        self.devices.render_status(use_descriptions)
    }

    /// Reissue every known device state.
    pub fn reinitialize(&mut self) {
        tracing::info!("reinitialising all known devices");
        self.reissue_known_states(None);
    }

    pub fn set_events_file(&mut self, path: Option<PathBuf>) {
        self.events.redirect(path.as_deref());
        tracing::info!(path = ?path, "events file set");
        self.settings.events_file = path;
    }

    pub fn set_commands_file(&mut self, path: Option<PathBuf>) {
        tracing::info!(path = ?path, "commands file set");
        self.settings.commands_file = path;
    }

    pub fn commands_file(&self) -> Option<&Path> {
        self.settings.commands_file.as_deref()
    }

    // ── Transport servicing ───────────────────────────────────────

    /// Drain whatever the transport has buffered through the pipeline.
    /// Returns the number of bytes read.
    pub fn service_transport(&mut self) -> usize {
        let mut total = 0;
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match self.transport.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    self.receive(&buf[..n]);
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to read from adapter");
                    break;
                }
            }
        }
        total
    }

    /// Feed raw adapter bytes into the pipeline.
    pub fn receive(&mut self, bytes: &[u8]) {
        for frame in self.assembler.push(bytes) {
            self.handle_frame(&frame);
        }
    }

    /// Ask the adapter for buffered power-line traffic.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transport`] when the write failed.
    pub fn poll_status(&mut self) -> Result<(), EngineError> {
        if !self.transport.is_available() {
            return Ok(());
        }
        tracing::trace!("polling adapter status");
        self.write_poll()?;
        self.read_waiting = true;
        Ok(())
    }

    /// Resend the status request if the previous one was never answered.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transport`] when the write failed.
    pub fn rearm_read_request(&mut self) -> Result<(), EngineError> {
        if !self.read_waiting || !self.transport.is_available() {
            return Ok(());
        }
        tracing::debug!("status request unanswered, sending it again");
        self.write_poll()
    }

    /// Try to bring an unavailable transport back. Returns whether it is
    /// available afterwards.
    pub fn try_reconnect(&mut self) -> bool {
        if self.transport.is_available() {
            return true;
        }
        match self.transport.reconnect() {
            Ok(()) => {
                tracing::info!("adapter connected");
                self.assembler.reset();
                self.decoder.reset();
                self.read_waiting = false;
                true
            }
            Err(error) => {
                tracing::debug!(%error, "adapter still unavailable");
                false
            }
        }
    }

    // ── Pipeline ──────────────────────────────────────────────────

    fn write_poll(&mut self) -> Result<(), EngineError> {
        let written = self.transport.write(STATUS_POLL)?;
        if written != STATUS_POLL.len() {
            return Err(EngineError::ShortWrite {
                written,
                expected: STATUS_POLL.len(),
            });
        }
        Ok(())
    }

    fn enqueue(&mut self, address: Address, function: Function) {
        if let PushOutcome::Saturated(snapshot) = self.queue.push(address, function) {
            tracing::debug!(dropped = ?snapshot.pending.first(), "dropped oldest unverified command");
        }
    }

    fn handle_frame(&mut self, frame: &Frame) {
        if !frame.is_null() {
            tracing::debug!(%frame, "received frame");
        }
        self.read_waiting = false;
        for event in self.decoder.decode(frame.payload()) {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: DeviceEvent) {
        let description = self.devices.describe(event.address);
        tracing::info!(address = %event.address, function = %event.function, %description, "device event");

        if self.settings.events_file.is_some() && self.devices.should_record_event(&event) {
            let record = EventRecord {
                address: event.address,
                function: event.function,
                description: description.clone(),
                timestamp: time::now(),
            };
            if let Err(error) = self.events.append(&record) {
                tracing::warn!(%error, "failed to record event");
            }
        }

        match self.queue.match_event(&event) {
            MatchOutcome::Verified(command) => {
                tracing::debug!(address = %command.address, function = %command.function, "verified command");
            }
            MatchOutcome::Unmatched => {
                tracing::debug!(%event, "event does not match oldest pending command");
            }
            MatchOutcome::Idle => {}
        }

        let changed = self
            .devices
            .update(&event)
            .is_some_and(|update| update.changed());

        match self.triggers.resolve(&event, changed) {
            Resolution::Run {
                class,
                wildcard,
                action,
            } => self.run_action(&event, &description, class, wildcard, &action),
            Resolution::Reset { class } => {
                tracing::info!(%event, %class, "trigger requested reset");
                self.reset(event.address);
            }
            Resolution::Suppressed => tracing::debug!(%event, "triggers suppressed by never rule"),
            Resolution::NotApplicable | Resolution::Unhandled => {}
        }
    }

    fn run_action(
        &mut self,
        event: &DeviceEvent,
        description: &str,
        class: FiringClass,
        wildcard: bool,
        action: &ActionTemplate,
    ) {
        let values = Substitution {
            address: event.address,
            function: event.function,
            description,
        };
        let command = match action.render(&values, self.action_capacity) {
            Ok(command) => command,
            Err(error) => {
                tracing::warn!(%error, %event, template = action.as_str(), "skipping action");
                return;
            }
        };

        tracing::info!(%event, %class, wildcard, %command, "running action");
        match self.runner.run(&command) {
            Ok(outcome) => tracing::info!(exit_code = ?outcome.exit_code, "action finished"),
            Err(error) => tracing::warn!(%error, %command, "action failed"),
        }
    }

    /// Reissue every known state except `exclude`, at most twice in a row.
    fn reset(&mut self, exclude: Address) {
        if !self.coordinator.request() {
            return;
        }
        tracing::info!(%exclude, "resetting all devices to their known state");
        self.reissue_known_states(Some(exclude));
        if self.coordinator.finish_run() {
            tracing::info!("running pending reset");
            self.reissue_known_states(Some(exclude));
            self.coordinator.finish_final();
        }
    }

    fn reissue_known_states(&mut self, exclude: Option<Address>) -> usize {
        let targets: Vec<_> = self
            .devices
            .known_states()
            .filter(|(address, _)| Some(*address) != exclude)
            .filter_map(|(address, state)| state.as_function().map(|f| (address, f)))
            .collect();

        let mut sent = 0;
        for (address, function) in targets {
            match self.send_command(address, function) {
                Ok(()) => sent += 1,
                Err(error) => tracing::warn!(%error, %address, "failed to reissue state"),
            }
        }
        sent
    }
}
