//! Device table — believed state and description of every address.
//!
//! State changes only through [`DeviceTable::update`] (decoded events) and
//! [`DeviceTable::set_unknown`] (explicit undefine).

use std::collections::BTreeMap;

use x10hub_domain::address::{Address, HOUSE_COUNT, UNIT_COUNT};
use x10hub_domain::event::DeviceEvent;
use x10hub_domain::function::Function;
use x10hub_domain::state::DeviceState;

const HOUSES: usize = HOUSE_COUNT as usize;
const UNITS: usize = UNIT_COUNT as usize;

/// A stored state replaced by a decoded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    pub old: DeviceState,
    pub new: DeviceState,
}

impl StateUpdate {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.old != self.new
    }
}

/// One state per address, plus optional descriptions.
#[derive(Debug, Default)]
pub struct DeviceTable {
    states: [[DeviceState; UNITS]; HOUSES],
    descriptions: BTreeMap<Address, String>,
    last_recorded: Option<(Address, Function)>,
}

impl DeviceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self, address: Address) -> DeviceState {
        self.states[address.house.index()][address.unit.index()]
    }

    /// Apply the state implied by `event`, if it carries one.
    pub fn update(&mut self, event: &DeviceEvent) -> Option<StateUpdate> {
        let new = event.implied_state()?;
        let address = event.address;
        let slot = &mut self.states[address.house.index()][address.unit.index()];
        let update = StateUpdate { old: *slot, new };
        *slot = new;

        tracing::debug!(%address, function = %event.function, %new, "device state update");
        if update.changed() {
            match self.descriptions.get(&address) {
                Some(description) => tracing::info!(
                    %address,
                    %description,
                    "device changed state from {} to {}",
                    update.old,
                    update.new
                ),
                None => tracing::info!(
                    %address,
                    "device changed state from {} to {}",
                    update.old,
                    update.new
                ),
            }
        }
        Some(update)
    }

    /// Forget the state of `address`; returns the state it had.
    pub fn set_unknown(&mut self, address: Address) -> DeviceState {
        std::mem::take(&mut self.states[address.house.index()][address.unit.index()])
    }

    /// Whether `event` should go to the events log.
    ///
    /// Consecutive repeats of the same address and function are recorded
    /// once.
    pub fn should_record_event(&mut self, event: &DeviceEvent) -> bool {
        let key = (event.address, event.function);
        if self.last_recorded == Some(key) {
            return false;
        }
        self.last_recorded = Some(key);
        true
    }

    #[must_use]
    pub fn description(&self, address: Address) -> Option<&str> {
        self.descriptions.get(&address).map(String::as_str)
    }

    /// The description, or the address itself (`A3`) when none is set.
    #[must_use]
    pub fn describe(&self, address: Address) -> String {
        self.description(address)
            .map_or_else(|| address.to_string(), str::to_string)
    }

    /// Add or replace a description; blank text removes it.
    pub fn set_description(&mut self, address: Address, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.descriptions.remove(&address);
        } else {
            self.descriptions.insert(address, text.to_string());
        }
    }

    /// Descriptions ordered by address.
    pub fn descriptions(&self) -> impl Iterator<Item = (Address, &str)> {
        self.descriptions
            .iter()
            .map(|(address, text)| (*address, text.as_str()))
    }

    /// Every address with an observed state, house-major.
    pub fn known_states(&self) -> impl Iterator<Item = (Address, DeviceState)> + '_ {
        Address::all()
            .map(|address| (address, self.state(address)))
            .filter(|(_, state)| state.is_known())
    }

    /// One line per known device, labelled by description or by address.
    #[must_use]
    pub fn render_status(&self, use_descriptions: bool) -> String {
        let mut out = String::new();
        for (address, state) in self.known_states() {
            let line = if use_descriptions {
                format!("{} {state:<4}", self.describe(address))
            } else {
                format!("{} {} {state:<4}", address.house, address.unit)
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
