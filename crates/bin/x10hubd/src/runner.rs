//! Shell action runner — trigger commands run through `<shell> -c`.

use std::process::{Command, Stdio};

use x10hub_app::ports::{ActionError, ActionOutcome, ActionRunner};

/// Runs actions to completion with stdin and stdout detached.
#[derive(Debug, Clone)]
pub struct ShellActionRunner {
    shell: String,
}

impl ShellActionRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl ActionRunner for ShellActionRunner {
    fn run(&mut self, command: &str) -> Result<ActionOutcome, ActionError> {
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(ActionError::Spawn)?;
        Ok(ActionOutcome {
            exit_code: status.code(),
        })
    }
}
