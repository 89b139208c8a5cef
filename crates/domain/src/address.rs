//! Address — a house code (A–P) and a unit number (1–16).
//!
//! Every controllable X10 device is reached through exactly one
//! [`Address`]. House codes are numbered 1..=16 internally and rendered
//! as the letters `A`..=`P` on the wire and in logs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of house codes (and of units per house code).
pub const HOUSE_COUNT: u8 = 16;

/// Number of units addressable within one house code.
pub const UNIT_COUNT: u8 = 16;

/// A house code, `A` (1) through `P` (16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HouseCode(u8);

impl HouseCode {
    /// Build a house code from its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::HouseOutOfRange`] outside `1..=16`.
    pub fn new(number: u8) -> Result<Self, ValidationError> {
        if (1..=HOUSE_COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ValidationError::HouseOutOfRange(number))
        }
    }

    /// Parse a house letter, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHouseLetter`] for anything but `A..=P`.
    pub fn from_letter(letter: char) -> Result<Self, ValidationError> {
        let upper = letter.to_ascii_uppercase();
        if ('A'..='P').contains(&upper) {
            Ok(Self(upper as u8 - b'A' + 1))
        } else {
            Err(ValidationError::InvalidHouseLetter(letter))
        }
    }

    /// Wire form of an uppercase house letter byte, if it is one.
    #[must_use]
    pub fn from_wire(byte: u8) -> Option<Self> {
        (b'A'..=b'P').contains(&byte).then(|| Self(byte - b'A' + 1))
    }

    /// The 1-based house number.
    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    /// The house letter (`A`..=`P`).
    #[must_use]
    pub fn letter(self) -> char {
        char::from(b'A' + self.0 - 1)
    }

    /// Zero-based position, useful for fixed-size tables.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// All sixteen house codes in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=HOUSE_COUNT).map(Self)
    }
}

impl TryFrom<u8> for HouseCode {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HouseCode> for u8 {
    fn from(value: HouseCode) -> Self {
        value.0
    }
}

impl fmt::Display for HouseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A unit number within a house code, 1 through 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Unit(u8);

impl Unit {
    /// Build a unit from its number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnitOutOfRange`] outside `1..=16`.
    pub fn new(number: u32) -> Result<Self, ValidationError> {
        match u8::try_from(number) {
            Ok(n) if (1..=UNIT_COUNT).contains(&n) => Ok(Self(n)),
            _ => Err(ValidationError::UnitOutOfRange(number)),
        }
    }

    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position, useful for fixed-size tables.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// All sixteen units in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=UNIT_COUNT).map(Self)
    }
}

impl TryFrom<u8> for Unit {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(u32::from(value))
    }
}

impl From<Unit> for u8 {
    fn from(value: Unit) -> Self {
        value.0
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A device address: house code plus unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    pub house: HouseCode,
    pub unit: Unit,
}

impl Address {
    #[must_use]
    pub fn new(house: HouseCode, unit: Unit) -> Self {
        Self { house, unit }
    }

    /// Every address, house-major (`A1`, `A2`, … `P16`).
    pub fn all() -> impl Iterator<Item = Self> {
        HouseCode::all().flat_map(|house| Unit::all().map(move |unit| Self { house, unit }))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.house, self.unit)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    /// Accepts `A3`, `a03` and `A 3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = chars
            .next()
            .ok_or_else(|| ValidationError::MalformedAddress(s.to_string()))?;
        let house = HouseCode::from_letter(letter)?;
        let digits = chars.as_str().trim_start();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::MalformedAddress(s.to_string()));
        }
        let number: u32 = digits
            .parse()
            .map_err(|_| ValidationError::MalformedAddress(s.to_string()))?;
        Ok(Self::new(house, Unit::new(number)?))
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn should_map_house_letters_to_numbers() {
        assert_eq!(HouseCode::from_letter('A').unwrap().number(), 1);
        assert_eq!(HouseCode::from_letter('p').unwrap().number(), 16);
        assert_eq!(HouseCode::new(3).unwrap().letter(), 'C');
    }

    #[test]
    fn should_reject_letters_past_p() {
        assert_eq!(
            HouseCode::from_letter('Q'),
            Err(ValidationError::InvalidHouseLetter('Q'))
        );
    }

    #[test]
    fn should_reject_house_zero() {
        assert!(HouseCode::new(0).is_err());
        assert!(HouseCode::new(17).is_err());
    }

    #[test]
    fn should_only_accept_uppercase_on_the_wire() {
        assert!(HouseCode::from_wire(b'C').is_some());
        assert!(HouseCode::from_wire(b'c').is_none());
        assert!(HouseCode::from_wire(b'Q').is_none());
    }

    #[test]
    fn should_reject_unit_out_of_range() {
        assert_eq!(Unit::new(0), Err(ValidationError::UnitOutOfRange(0)));
        assert_eq!(Unit::new(17), Err(ValidationError::UnitOutOfRange(17)));
        assert_eq!(Unit::new(16).unwrap().number(), 16);
    }

    #[test]
    fn should_parse_compact_padded_and_spaced_addresses() {
        assert_eq!(addr("A3"), addr("a03"));
        assert_eq!(addr("A 3"), addr("A3"));
        assert_eq!(addr("P16").to_string(), "P16");
    }

    #[test]
    fn should_reject_malformed_addresses() {
        assert!("".parse::<Address>().is_err());
        assert!("A".parse::<Address>().is_err());
        assert!("A3x".parse::<Address>().is_err());
        assert!("Z3".parse::<Address>().is_err());
    }

    #[test]
    fn should_enumerate_all_addresses_house_major() {
        let all: Vec<_> = Address::all().collect();
        assert_eq!(all.len(), 256);
        assert_eq!(all[0].to_string(), "A1");
        assert_eq!(all[16].to_string(), "B1");
        assert_eq!(all[255].to_string(), "P16");
    }

    #[test]
    fn should_order_by_house_then_unit() {
        assert!(addr("A16") < addr("B1"));
        assert!(addr("B1") < addr("B2"));
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let address = addr("K12");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"K12\"");
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, address);
    }
}
