//! Control operations — what an operator (or a replayed commands file)
//! can ask the engine to do.

use std::path::PathBuf;

use x10hub_domain::action::ActionTemplate;
use x10hub_domain::address::Address;
use x10hub_domain::function::Function;
use x10hub_domain::trigger::{FiringClass, FunctionMatch, TriggerScope};

/// One request to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOp {
    SendCommand {
        address: Address,
        function: Function,
    },
    AddOrReplaceTrigger {
        scope: TriggerScope,
        function: FunctionMatch,
        class: FiringClass,
        action: Option<ActionTemplate>,
    },
    AddOrReplaceDescription {
        address: Address,
        text: String,
    },
    UndefineState {
        address: Address,
    },
    /// `None` disables the events log.
    SetEventsFile(Option<PathBuf>),
    SetCommandsFile(Option<PathBuf>),
    RenderStateDump {
        path: Option<PathBuf>,
    },
    RenderStatus {
        use_descriptions: bool,
        path: Option<PathBuf>,
    },
    Reinitialize,
}

/// Result of applying a [`ControlOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    Done,
    /// Text for the caller to write out.
    Report(Report),
}

/// Rendered text and where it should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub body: String,
    /// `None` means the log.
    pub destination: Option<PathBuf>,
    /// Append to the destination instead of replacing it.
    pub append: bool,
}
