//! Trigger rule — which action runs when a function is seen at an address.
//!
//! A rule is keyed by its [`TriggerScope`] and [`FiringClass`]; the
//! [`FunctionMatch`] narrows which functions it reacts to. A rule without
//! an action on a Transition/Always class means "resynchronise every known
//! device" instead of running a command.

use serde::{Deserialize, Serialize};

use crate::action::ActionTemplate;
use crate::address::Address;
use crate::function::Function;

/// Which addresses a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "address", rename_all = "snake_case")]
pub enum TriggerScope {
    Address(Address),
    All,
}

/// Which functions a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionMatch {
    Only(Function),
    Any,
}

impl FunctionMatch {
    #[must_use]
    pub fn matches(self, function: Function) -> bool {
        match self {
            Self::Only(expected) => expected == function,
            Self::Any => true,
        }
    }
}

impl From<Option<Function>> for FunctionMatch {
    fn from(value: Option<Function>) -> Self {
        value.map_or(Self::Any, Self::Only)
    }
}

/// When a matching rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiringClass {
    /// Only when the event changed the device's state.
    Transition,
    /// On every matching event.
    Always,
    /// Never; suppresses every other rule for the address.
    Never,
}

impl FiringClass {
    /// Control-language keyword for this class.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Transition => "trigger",
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

impl std::fmt::Display for FiringClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single trigger rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRule {
    pub scope: TriggerScope,
    pub function: FunctionMatch,
    pub class: FiringClass,
    /// `None` on Transition/Always requests a full reset.
    pub action: Option<ActionTemplate>,
}

impl TriggerRule {
    #[must_use]
    pub fn new(
        scope: TriggerScope,
        function: FunctionMatch,
        class: FiringClass,
        action: Option<ActionTemplate>,
    ) -> Self {
        Self {
            scope,
            function,
            class,
            action,
        }
    }

    /// Whether this rule occupies the slot identified by `(scope, function, class)`.
    ///
    /// Never rules own their whole address, whatever the function.
    #[must_use]
    pub fn has_key(&self, scope: TriggerScope, function: FunctionMatch, class: FiringClass) -> bool {
        self.scope == scope
            && self.class == class
            && (class == FiringClass::Never || self.function == function)
    }

    /// Whether the rule requests a reset rather than a command.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.action.is_none() && self.class != FiringClass::Never
    }
}

/// Renders the rule as a control-language line that reloads to the same rule.
impl std::fmt::Display for TriggerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match self.scope {
            TriggerScope::All => "all".to_string(),
            TriggerScope::Address(address) => {
                format!("{}{:02}", address.house, address.unit.number())
            }
        };
        let function = match self.function {
            FunctionMatch::Only(function) => Some(function.mnemonic()),
            FunctionMatch::Any => None,
        };

        let mut parts: Vec<&str> = Vec::with_capacity(4);
        match (self.class, &self.action) {
            (FiringClass::Always, None) => parts.push("reset"),
            // Transition resets have no control-language form.
            (FiringClass::Transition, None) => parts.push("# trigger"),
            (class, _) => parts.push(class.keyword()),
        }
        parts.push(&target);
        parts.extend(function);
        if let Some(action) = &self.action {
            parts.push(action.as_str());
        }
        f.write_str(&parts.join(" "))
    }
}
