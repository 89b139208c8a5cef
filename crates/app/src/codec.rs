//! Wire codec for the TI103 adapter.
//!
//! Outgoing commands repeat the address and the function twice
//! (`A03A03 AONAON`), behind the `$>28001` prefix and followed by a
//! two-digit checksum. Replies are free-form runs of house letters, unit
//! numbers and function mnemonics which [`Decoder`] scans into
//! [`DeviceEvent`]s.

use x10hub_domain::address::{Address, HOUSE_COUNT, HouseCode, Unit};
use x10hub_domain::event::DeviceEvent;
use x10hub_domain::function::Function;

use crate::frame::{FRAME_TERMINATOR, REPLY_PREAMBLE};

/// Prefix of every outgoing command.
pub const COMMAND_PREFIX: &[u8] = b"$>28001";

/// Request asking the adapter to report what it has received.
pub const STATUS_POLL: &[u8] = b"$>2800008C#";

/// Checksum characters used on locally echoed frames.
const ECHO_CHECKSUM: &[u8] = b"CC";

/// Sum of all bytes, modulo 256.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// The command text for `(address, function)`, without prefix or checksum.
#[must_use]
pub fn command_text(address: Address, function: Function) -> String {
    let house = address.house.letter();
    let unit = address.unit.number();
    let mnemonic = function.mnemonic();
    format!("{house}{unit:02}{house}{unit:02} {house}{mnemonic}{house}{mnemonic}")
}

/// Encode a complete command frame ready to be written to the adapter.
#[must_use]
pub fn encode(address: Address, function: Function) -> Vec<u8> {
    let text = command_text(address, function);
    let mut out = Vec::with_capacity(COMMAND_PREFIX.len() + text.len() + 3);
    out.extend_from_slice(COMMAND_PREFIX);
    out.extend_from_slice(text.as_bytes());
    let sum = checksum(&out);
    out.extend_from_slice(format!("{sum:02x}").as_bytes());
    out.push(FRAME_TERMINATOR);
    out
}

/// The reply the adapter would send had it heard `(address, function)`.
///
/// Used while offline so commands still flow through the receive path.
#[must_use]
pub fn local_echo(address: Address, function: Function) -> Vec<u8> {
    let text = command_text(address, function);
    let mut out = Vec::with_capacity(REPLY_PREAMBLE.len() + text.len() + 3);
    out.extend_from_slice(REPLY_PREAMBLE);
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(ECHO_CHECKSUM);
    out.push(FRAME_TERMINATOR);
    out
}

/// Stateful reply scanner.
///
/// Unit numbers are remembered per house until a function completes them,
/// so an address and its function may arrive in different frames.
#[derive(Debug, Default)]
pub struct Decoder {
    pending_units: [Option<Unit>; HOUSE_COUNT as usize],
    current_house: Option<HouseCode>,
    after_house: bool,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a frame payload. Unrecognised bytes are skipped.
    pub fn decode(&mut self, payload: &[u8]) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        let mut i = 0;
        while i < payload.len() {
            let byte = payload[i];
            let rest = &payload[i..];

            if byte == b' ' {
                self.after_house = false;
                i += 1;
                continue;
            }

            if self.after_house
                && let Some(function) = Function::match_prefix(rest)
            {
                self.complete(function, &mut events);
                i += function.mnemonic().len();
                continue;
            }
            self.after_house = false;

            if let Some(house) = HouseCode::from_wire(byte)
                && rest.get(1).is_some_and(|next| {
                    next.is_ascii_digit() || Function::match_prefix(&rest[1..]).is_some()
                })
            {
                self.current_house = Some(house);
                self.after_house = true;
                i += 1;
                continue;
            }

            if byte.is_ascii_digit() {
                let len = rest.iter().take_while(|b| b.is_ascii_digit()).count();
                let number = rest[..len].iter().fold(0u32, |acc, d| {
                    acc.saturating_mul(10).saturating_add(u32::from(d - b'0'))
                });
                self.set_pending_unit(number);
                i += len;
                continue;
            }

            if let Some(function) = Function::match_prefix(rest) {
                self.complete(function, &mut events);
                i += function.mnemonic().len();
                continue;
            }

            if let Some(house) = HouseCode::from_wire(byte) {
                self.current_house = Some(house);
                self.after_house = true;
            } else {
                tracing::trace!(byte, "skipping unrecognised reply byte");
            }
            i += 1;
        }
        events
    }

    /// Forget partially received addresses.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_pending_unit(&mut self, number: u32) {
        let Some(house) = self.current_house else {
            return;
        };
        self.pending_units[house.index()] = Unit::new(number).ok();
    }

    fn complete(&mut self, function: Function, events: &mut Vec<DeviceEvent>) {
        let Some(house) = self.current_house else {
            return;
        };
        if let Some(unit) = self.pending_units[house.index()].take() {
            events.push(DeviceEvent::new(Address::new(house, unit), function));
            self.current_house = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn strip_checksum(frame: &[u8]) -> &[u8] {
        &frame[COMMAND_PREFIX.len()..frame.len() - 3]
    }

    // ── Encoding ──────────────────────────────────────────────────

    #[test]
    fn should_encode_command_byte_exact() {
        assert_eq!(encode(addr("A3"), Function::On), b"$>28001A03A03 AONAON81#");
        assert_eq!(encode(addr("A3"), Function::Off), b"$>28001A03A03 AOFFAOFFfd#");
        assert_eq!(encode(addr("B12"), Function::On), b"$>28001B12B12 BONBON85#");
        assert_eq!(
            encode(addr("P16"), Function::StatusRequest),
            b"$>28001P16P16 PSRQPSRQ77#"
        );
    }

    #[test]
    fn should_compute_checksum_modulo_256() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(checksum(&[0xff, 0x02]), 0x01);
        assert_eq!(checksum(b"$>28000"), 0x5c);
    }

    #[test]
    fn should_build_local_echo_frame() {
        assert_eq!(local_echo(addr("C1"), Function::Dim), b"$<2800!C01C01 CDIMCDIMCC#");
    }

    // ── Decoding ──────────────────────────────────────────────────

    #[test]
    fn should_decode_compact_reply() {
        let events = Decoder::new().decode(b"A03ON");
        assert_eq!(events, vec![DeviceEvent::new(addr("A3"), Function::On)]);
        assert_eq!(events[0].implied_state(), Some(x10hub_domain::state::DeviceState::On));
    }

    #[test]
    fn should_decode_every_encoded_command_back() {
        for address in Address::all() {
            for function in Function::DECODE_PRIORITY {
                let frame = encode(address, function);
                let events = Decoder::new().decode(strip_checksum(&frame));
                assert_eq!(
                    events,
                    vec![DeviceEvent::new(address, function)],
                    "round trip of {address} {function}"
                );
            }
        }
    }

    #[test]
    fn should_decode_several_events_in_one_payload() {
        let events = Decoder::new().decode(b"A1ON B12 OFF C3DIM");
        assert_eq!(
            events,
            vec![
                DeviceEvent::new(addr("A1"), Function::On),
                DeviceEvent::new(addr("B12"), Function::Off),
                DeviceEvent::new(addr("C3"), Function::Dim),
            ]
        );
    }

    #[test]
    fn should_consume_mnemonic_without_pending_unit() {
        assert!(Decoder::new().decode(b"AON").is_empty());
        assert!(Decoder::new().decode(b"ON").is_empty());
    }

    #[test]
    fn should_ignore_out_of_range_units() {
        assert!(Decoder::new().decode(b"A17ON").is_empty());
        assert!(Decoder::new().decode(b"A0ON").is_empty());
        assert!(Decoder::new().decode(b"A99999999999ON").is_empty());
    }

    #[test]
    fn should_skip_noise_without_aborting() {
        let events = Decoder::new().decode(b"zz?A3!ON");
        assert_eq!(events, vec![DeviceEvent::new(addr("A3"), Function::On)]);
    }

    #[test]
    fn should_remember_pending_unit_across_payloads() {
        let mut decoder = Decoder::new();
        assert!(decoder.decode(b"D7").is_empty());
        let events = decoder.decode(b"DOFF");
        assert_eq!(events, vec![DeviceEvent::new(addr("D7"), Function::Off)]);
    }

    #[test]
    fn should_forget_pending_units_on_reset() {
        let mut decoder = Decoder::new();
        decoder.decode(b"D7");
        decoder.reset();
        assert!(decoder.decode(b"DOFF").is_empty());
    }

    #[test]
    fn should_track_pending_units_per_house() {
        let events = Decoder::new().decode(b"A2B5AONBOFF");
        assert_eq!(
            events,
            vec![
                DeviceEvent::new(addr("A2"), Function::On),
                DeviceEvent::new(addr("B5"), Function::Off),
            ]
        );
    }
}
