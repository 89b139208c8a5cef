//! # x10hub-domain
//!
//! Pure domain model for the x10hub power-line bridge.
//!
//! ## Responsibilities
//! - Foundational types: addresses, error conventions, timestamps
//! - Define **Addresses** (house code A–P + unit 1–16)
//! - Define **Functions** (the X10 operation codes and their wire mnemonics)
//! - Define **Device states** (unknown / on / off)
//! - Define **Events** (a function observed at an address)
//! - Define **Triggers** (address/function → action rules with a firing class)
//! - Define **Action templates** (bounded `%h/%u/%f/%d` substitution)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod action;
pub mod address;
pub mod event;
pub mod function;
pub mod state;
pub mod trigger;
