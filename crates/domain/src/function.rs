//! Function — the X10 operation carried by a command or observed on the line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::state::DeviceState;

/// An X10 function code, identified on the wire by a 2–3 letter mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Function {
    On,
    Off,
    Dim,
    Bright,
    AllLightsOn,
    AllUnitsOff,
    AllLightsOff,
    HailRequest,
    HailAck,
    PresetDim0,
    PresetDim1,
    StatusOn,
    StatusOff,
    StatusRequest,
}

impl Function {
    /// Order in which mnemonics are tried when scanning a reply.
    pub const DECODE_PRIORITY: [Self; 14] = [
        Self::On,
        Self::Off,
        Self::Dim,
        Self::Bright,
        Self::AllLightsOn,
        Self::AllUnitsOff,
        Self::AllLightsOff,
        Self::HailRequest,
        Self::HailAck,
        Self::PresetDim0,
        Self::PresetDim1,
        Self::StatusOn,
        Self::StatusOff,
        Self::StatusRequest,
    ];

    /// Wire mnemonic (`ON`, `OFF`, `DIM`, `BGT`, …).
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Dim => "DIM",
            Self::Bright => "BGT",
            Self::AllLightsOn => "ALN",
            Self::AllUnitsOff => "AUF",
            Self::AllLightsOff => "ALF",
            Self::HailRequest => "HRQ",
            Self::HailAck => "HAK",
            Self::PresetDim0 => "PR0",
            Self::PresetDim1 => "PR1",
            Self::StatusOn => "SON",
            Self::StatusOff => "SOF",
            Self::StatusRequest => "SRQ",
        }
    }

    /// Match a mnemonic at the start of `bytes`, honouring
    /// [`DECODE_PRIORITY`](Self::DECODE_PRIORITY).
    #[must_use]
    pub fn match_prefix(bytes: &[u8]) -> Option<Self> {
        Self::DECODE_PRIORITY
            .into_iter()
            .find(|function| bytes.starts_with(function.mnemonic().as_bytes()))
    }

    /// The device state this function implies, if any.
    ///
    /// `ON`, `BGT` and `SON` imply on; `OFF` and `SOF` imply off.
    #[must_use]
    pub fn implied_state(self) -> Option<DeviceState> {
        match self {
            Self::On | Self::Bright | Self::StatusOn => Some(DeviceState::On),
            Self::Off | Self::StatusOff => Some(DeviceState::Off),
            _ => None,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

impl FromStr for Function {
    type Err = ValidationError;

    /// Parses a mnemonic case-insensitively; the whole string must match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::DECODE_PRIORITY
            .into_iter()
            .find(|function| function.mnemonic() == upper)
            .ok_or_else(|| ValidationError::UnknownFunction(s.to_string()))
    }
}

impl TryFrom<String> for Function {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Function> for String {
    fn from(value: Function) -> Self {
        value.mnemonic().to_string()
    }
}
