//! Reset coordinator — keeps full resynchronisation runs from nesting.
//!
//! A reset reissues every known device state. Those writes can produce
//! events whose triggers ask for another reset while the first one is
//! still going; such a request is remembered and served by exactly one
//! follow-up run.

/// Where the coordinator stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPhase {
    #[default]
    Idle,
    Running,
    /// Running, and another run was requested meanwhile.
    RunningWithPending,
}

/// Three-state guard around reset runs.
#[derive(Debug, Default)]
pub struct ResetCoordinator {
    phase: ResetPhase,
    completed_runs: u64,
}

impl ResetCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> ResetPhase {
        self.phase
    }

    /// Number of reset runs finished so far.
    #[must_use]
    pub fn completed_runs(&self) -> u64 {
        self.completed_runs
    }

    /// Ask for a run. Returns `true` when the caller should start one now;
    /// otherwise the request is folded into the pending flag.
    pub fn request(&mut self) -> bool {
        match self.phase {
            ResetPhase::Idle => {
                self.phase = ResetPhase::Running;
                true
            }
            ResetPhase::Running | ResetPhase::RunningWithPending => {
                tracing::debug!("reset already running, marking it pending");
                self.phase = ResetPhase::RunningWithPending;
                false
            }
        }
    }

    /// Mark the first run finished. Returns `true` when a follow-up run was
    /// requested meanwhile and should start now.
    pub fn finish_run(&mut self) -> bool {
        self.completed_runs += 1;
        match self.phase {
            ResetPhase::RunningWithPending => {
                self.phase = ResetPhase::Running;
                true
            }
            ResetPhase::Running | ResetPhase::Idle => {
                self.phase = ResetPhase::Idle;
                false
            }
        }
    }

    /// Mark the follow-up run finished and go idle. Returns `true` when a
    /// request arrived during the follow-up; it is dropped.
    pub fn finish_final(&mut self) -> bool {
        self.completed_runs += 1;
        let dropped = self.phase == ResetPhase::RunningWithPending;
        if dropped {
            tracing::debug!("dropping reset requested during follow-up run");
        }
        self.phase = ResetPhase::Idle;
        dropped
    }
}
