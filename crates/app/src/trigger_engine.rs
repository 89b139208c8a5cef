//! Trigger engine — decides what a decoded event should run.
//!
//! Resolution for an event at address `A` with function `F`:
//!
//! 1. Only state-carrying functions and `HAK` are considered; for `HAK`
//!    the state-change gate below is bypassed.
//! 2. A `never` rule on `A` (any function) suppresses everything,
//!    including the wildcard.
//! 3. A `trigger` rule matching `(A, F)` fires when the state changed.
//! 4. Otherwise an `always` rule matching `(A, F)` fires.
//! 5. When nothing fired, the effective `all` rule (the most recently
//!    added one) fires if its function matches, unless it is a `never`
//!    rule.
//!
//! Within a class a rule naming `F` exactly beats a rule for any function.

use std::collections::BTreeMap;

use x10hub_domain::action::ActionTemplate;
use x10hub_domain::address::Address;
use x10hub_domain::event::DeviceEvent;
use x10hub_domain::function::Function;
use x10hub_domain::trigger::{FiringClass, FunctionMatch, TriggerRule, TriggerScope};

/// What [`TriggerSet::add_or_replace`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleChange {
    Inserted,
    Replaced,
    Removed,
    /// An empty action was given for a rule that does not exist.
    Ignored,
}

/// What [`TriggerSet::resolve`] decided for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The function never dispatches (`DIM`, `ALN`, …).
    NotApplicable,
    /// A `never` rule matched.
    Suppressed,
    /// Run a command.
    Run {
        class: FiringClass,
        wildcard: bool,
        action: ActionTemplate,
    },
    /// Reissue every known device state.
    Reset { class: FiringClass },
    /// No rule matched.
    Unhandled,
}

impl Resolution {
    fn from_rule(rule: &TriggerRule, wildcard: bool) -> Self {
        if rule.is_reset() {
            return Self::Reset { class: rule.class };
        }
        match &rule.action {
            Some(action) => Self::Run {
                class: rule.class,
                wildcard,
                action: action.clone(),
            },
            None => Self::Suppressed,
        }
    }
}

/// Every configured trigger rule.
#[derive(Debug, Default)]
pub struct TriggerSet {
    specific: BTreeMap<Address, Vec<TriggerRule>>,
    /// At most one rule per class; the last one is effective.
    wildcard: Vec<TriggerRule>,
}

impl TriggerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specific.values().map(Vec::len).sum::<usize>() + self.wildcard.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address rules ordered by address, then the wildcard rules.
    pub fn rules(&self) -> impl Iterator<Item = &TriggerRule> {
        self.specific.values().flatten().chain(&self.wildcard)
    }

    /// Add a rule, or replace the action of the rule with the same key.
    ///
    /// `None` asks for a reset (or, on `never`, nothing at all). An empty
    /// template removes the existing rule and is otherwise a no-op, except
    /// for `never` where it still installs the rule.
    pub fn add_or_replace(
        &mut self,
        scope: TriggerScope,
        function: FunctionMatch,
        class: FiringClass,
        action: Option<ActionTemplate>,
    ) -> RuleChange {
        let clears = action.as_ref().is_some_and(ActionTemplate::is_empty);
        let rules = match scope {
            TriggerScope::Address(address) => self.specific.entry(address).or_default(),
            TriggerScope::All => &mut self.wildcard,
        };
        let existing = rules
            .iter()
            .position(|rule| rule.has_key(scope, function, class));

        let change = match existing {
            Some(index) if clears => {
                let removed = rules.remove(index);
                tracing::info!(rule = %removed, "removed trigger");
                RuleChange::Removed
            }
            Some(index) => {
                let mut rule = rules.remove(index);
                rule.action = action;
                if class == FiringClass::Never {
                    rule.function = function;
                }
                tracing::info!(rule = %rule, "replaced trigger");
                // The most recent wildcard is the effective one.
                rules.push(rule);
                RuleChange::Replaced
            }
            None if clears && class != FiringClass::Never => {
                tracing::debug!(?scope, "ignoring empty trigger for unknown rule");
                RuleChange::Ignored
            }
            None => {
                let action = if clears { None } else { action };
                let rule = TriggerRule::new(scope, function, class, action);
                tracing::info!(rule = %rule, "new trigger");
                rules.push(rule);
                RuleChange::Inserted
            }
        };

        if let TriggerScope::Address(address) = scope
            && self.specific.get(&address).is_some_and(Vec::is_empty)
        {
            self.specific.remove(&address);
        }
        change
    }

    /// Pick the action for `event`; `changed` tells whether it changed the
    /// device's state.
    #[must_use]
    pub fn resolve(&self, event: &DeviceEvent, changed: bool) -> Resolution {
        let function = event.function;
        let hail = function == Function::HailAck;
        if !hail && function.implied_state().is_none() {
            return Resolution::NotApplicable;
        }

        let rules = self
            .specific
            .get(&event.address)
            .map_or(&[][..], Vec::as_slice);

        if rules.iter().any(|rule| rule.class == FiringClass::Never) {
            return Resolution::Suppressed;
        }
        if (changed || hail)
            && let Some(rule) = best_match(rules, FiringClass::Transition, function)
        {
            return Resolution::from_rule(rule, false);
        }
        if let Some(rule) = best_match(rules, FiringClass::Always, function) {
            return Resolution::from_rule(rule, false);
        }

        match self.wildcard.last() {
            Some(rule) if !rule.function.matches(function) => Resolution::Unhandled,
            Some(rule) if rule.class == FiringClass::Never => Resolution::Suppressed,
            Some(rule) => Resolution::from_rule(rule, true),
            None => Resolution::Unhandled,
        }
    }
}

fn best_match(rules: &[TriggerRule], class: FiringClass, function: Function) -> Option<&TriggerRule> {
    let candidates = move || rules.iter().filter(move |rule| rule.class == class);
    candidates()
        .find(|rule| rule.function == FunctionMatch::Only(function))
        .or_else(|| candidates().find(|rule| rule.function == FunctionMatch::Any))
}
