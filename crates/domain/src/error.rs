//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.

/// A value did not satisfy a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("house code {0} is out of range (1..=16)")]
    HouseOutOfRange(u8),

    #[error("'{0}' is not a house code letter (A..=P)")]
    InvalidHouseLetter(char),

    #[error("unit {0} is out of range (1..=16)")]
    UnitOutOfRange(u32),

    #[error("malformed address '{0}'")]
    MalformedAddress(String),

    #[error("unknown function mnemonic '{0}'")]
    UnknownFunction(String),
}

/// Substitution into an [`ActionTemplate`](crate::action::ActionTemplate) failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("rendered action exceeds {capacity} bytes")]
    Overflow { capacity: usize },
}
