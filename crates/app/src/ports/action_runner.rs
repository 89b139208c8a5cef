//! Action runner port — executes rendered trigger commands.

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    /// `None` when the command was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ActionOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("failed to spawn action")]
    Spawn(#[source] std::io::Error),
}

/// Runs a fully substituted command line.
pub trait ActionRunner {
    /// Run `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Spawn`] when the command could not start.
    fn run(&mut self, command: &str) -> Result<ActionOutcome, ActionError>;
}
