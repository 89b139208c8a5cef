//! Control-language parse errors.

use x10hub_domain::error::ValidationError;

/// Why a control line was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected a device address")]
    MissingAddress,

    #[error("expected a function after the address")]
    MissingFunction,

    #[error("'{0}' needs a device address before it")]
    FunctionWithoutAddress(String),

    #[error("unknown word '{0}'")]
    UnknownWord(String),

    #[error("unexpected trailing input '{0}'")]
    TrailingInput(String),

    #[error("invalid address")]
    Validation(#[from] ValidationError),
}
