//! # x10hub-app
//!
//! Application layer — the TI103 protocol engine and its **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Transport` — byte link to the adapter (serial port, or nothing)
//!   - `ActionRunner` — executes rendered trigger commands
//!   - `EventLog` — appends human-readable device event records
//! - Implement the protocol pipeline without doing any IO itself:
//!   - `FrameAssembler` — reassembles `#`-terminated replies
//!   - `codec` — command encoding, checksums and reply decoding
//!   - `VerificationQueue` — confirms written commands from their echoes
//!   - `DeviceTable` — believed device states, descriptions, event dedup
//!   - `TriggerSet` — rule storage and resolution
//!   - `ResetCoordinator` — bounds re-entrant resynchronisation
//! - Expose the **driving port**: `Engine::apply` with `ControlOp`s
//!
//! ## Dependency rule
//! Depends on `x10hub-domain` only (plus `tracing` and `thiserror`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod codec;
pub mod control;
pub mod device_table;
pub mod engine;
pub mod frame;
pub mod ports;
pub mod reset;
pub mod trigger_engine;
pub mod verification;

pub use control::{ControlOp, ControlReply, Report};
pub use engine::{Engine, EngineConfig, EngineError};
