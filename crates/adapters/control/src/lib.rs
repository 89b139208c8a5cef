//! # x10hub-adapter-control
//!
//! Control adapter — turns lines of the x10hub command language into
//! [`ControlOp`]s. The same language is read from stdin, replayed from the
//! commands file at startup, and produced by the state dump.
//!
//! | Line | Operation |
//! |------|-----------|
//! | `desc A3 Porch light` | set a description (`description` also works) |
//! | `trigger A3 ON cmd…` / `trigger all [FN] cmd…` | run `cmd` when the state changes |
//! | `always A3 ON cmd…` / `always all [FN] cmd…` | run `cmd` on every event |
//! | `never A3` / `never all` | suppress triggers |
//! | `reset A3 ON` | resynchronise every device on this event |
//! | `dump [path]`, `status [path]` | reports |
//! | `events [path]`, `commands [path]` | file settings; no path clears |
//! | `reinit` | reissue every known state |
//! | `A3 ON`, `A 3 OFF B4 DIM`, `A3 UND` | send commands / forget state |
//!
//! Keywords are case-insensitive and may be abbreviated (`de`, `tr`,
//! `res`, `eve`, `com`, `rei`, …). Lines starting with `#` are comments.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `x10hub-app` and `x10hub-domain`.

pub mod error;

use std::path::PathBuf;

use x10hub_app::ControlOp;
use x10hub_domain::action::ActionTemplate;
use x10hub_domain::address::{Address, HouseCode, Unit};
use x10hub_domain::function::Function;
use x10hub_domain::trigger::{FiringClass, FunctionMatch, TriggerScope};

pub use error::ParseError;

/// Pseudo-function that forgets a device's state instead of sending.
const UNDEFINE: &str = "UND";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Description,
    Trigger,
    Always,
    Never,
    Reset,
    Dump,
    Status,
    Events,
    Commands,
    Reinit,
}

/// Keywords with the shortest abbreviation each accepts. `always` and
/// `never` need two letters so `A 3 ON` and `N 3 ON` stay device commands.
const KEYWORDS: [(&str, usize, Keyword); 10] = [
    ("description", 2, Keyword::Description),
    ("trigger", 1, Keyword::Trigger),
    ("always", 2, Keyword::Always),
    ("never", 2, Keyword::Never),
    ("reset", 3, Keyword::Reset),
    ("dump", 4, Keyword::Dump),
    ("status", 6, Keyword::Status),
    ("events", 3, Keyword::Events),
    ("commands", 3, Keyword::Commands),
    ("reinit", 3, Keyword::Reinit),
];

/// Whether `word` abbreviates `full` with at least `min` letters.
fn abbreviates(word: &str, full: &str, min: usize) -> bool {
    word.len() >= min
        && word.len() <= full.len()
        && full.as_bytes()[..word.len()].eq_ignore_ascii_case(word.as_bytes())
}

fn parse_keyword(word: &str) -> Option<Keyword> {
    KEYWORDS
        .iter()
        .find(|(full, min, _)| abbreviates(word, full, *min))
        .map(|(_, _, keyword)| *keyword)
}

/// Parse one control line.
///
/// Blank lines and comments yield no operations.
///
/// # Errors
///
/// Returns [`ParseError`] when the line cannot be understood; nothing from
/// that line should be applied.
pub fn parse_line(line: &str) -> Result<Vec<ControlOp>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Vec::new());
    }

    let mut cursor = Cursor::new(line);
    let Some(first) = cursor.peek_word() else {
        return Ok(Vec::new());
    };

    let Some(keyword) = parse_keyword(first) else {
        return device_commands(&mut cursor);
    };
    cursor.word();

    let op = match keyword {
        Keyword::Description => {
            let address = cursor.address()?;
            ControlOp::AddOrReplaceDescription {
                address,
                text: cursor.rest().to_string(),
            }
        }
        Keyword::Trigger => rule(&mut cursor, FiringClass::Transition)?,
        Keyword::Always => rule(&mut cursor, FiringClass::Always)?,
        Keyword::Never => rule(&mut cursor, FiringClass::Never)?,
        Keyword::Reset => {
            let address = cursor.address()?;
            ControlOp::AddOrReplaceTrigger {
                scope: TriggerScope::Address(address),
                function: cursor.function_match(),
                class: FiringClass::Always,
                action: None,
            }
        }
        Keyword::Dump => ControlOp::RenderStateDump {
            path: cursor.path(),
        },
        Keyword::Status => ControlOp::RenderStatus {
            use_descriptions: true,
            path: cursor.path(),
        },
        Keyword::Events => ControlOp::SetEventsFile(cursor.path()),
        Keyword::Commands => ControlOp::SetCommandsFile(cursor.path()),
        Keyword::Reinit => {
            if !cursor.rest().is_empty() {
                return Err(ParseError::TrailingInput(cursor.rest().to_string()));
            }
            ControlOp::Reinitialize
        }
    };
    Ok(vec![op])
}

fn rule(cursor: &mut Cursor<'_>, class: FiringClass) -> Result<ControlOp, ParseError> {
    let (scope, function) = if cursor
        .peek_word()
        .is_some_and(|word| abbreviates(word, "all", 2))
    {
        cursor.word();
        (TriggerScope::All, cursor.function_match())
    } else {
        let address = cursor.address()?;
        (TriggerScope::Address(address), cursor.function_match())
    };

    let action = match class {
        FiringClass::Never => None,
        FiringClass::Transition | FiringClass::Always => Some(ActionTemplate::new(cursor.rest())),
    };
    Ok(ControlOp::AddOrReplaceTrigger {
        scope,
        function,
        class,
        action,
    })
}

/// `A3 ON`, `A 3 OFF B4 DIM`: each function applies to the last address.
fn device_commands(cursor: &mut Cursor<'_>) -> Result<Vec<ControlOp>, ParseError> {
    let mut ops = Vec::new();
    let mut current: Option<Address> = None;

    while let Some(word) = cursor.peek_word() {
        if word.eq_ignore_ascii_case(UNDEFINE) {
            cursor.word();
            let address = current.ok_or_else(|| ParseError::FunctionWithoutAddress(word.to_string()))?;
            ops.push(ControlOp::UndefineState { address });
        } else if let Ok(function) = word.parse::<Function>() {
            cursor.word();
            let address = current.ok_or_else(|| ParseError::FunctionWithoutAddress(word.to_string()))?;
            ops.push(ControlOp::SendCommand { address, function });
        } else {
            current = Some(cursor.address().map_err(|_| ParseError::UnknownWord(word.to_string()))?);
        }
    }

    if ops.is_empty() {
        return Err(ParseError::MissingFunction);
    }
    Ok(ops)
}

/// Word-at-a-time view over a line that can hand back the unparsed rest.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn peek_word(&self) -> Option<&'a str> {
        self.rest.split_whitespace().next()
    }

    fn word(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            self.rest = trimmed;
            return None;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (word, rest) = trimmed.split_at(end);
        self.rest = rest;
        Some(word)
    }

    fn rest(&self) -> &'a str {
        self.rest.trim()
    }

    /// `A3`, `a03`, or a house letter and unit as two words (`A 3`).
    fn address(&mut self) -> Result<Address, ParseError> {
        let word = self.word().ok_or(ParseError::MissingAddress)?;
        let mut letters = word.chars();
        if let (Some(letter), None) = (letters.next(), letters.next()) {
            let house = HouseCode::from_letter(letter)?;
            let digits = self.word().ok_or(ParseError::MissingAddress)?;
            let number: u32 = digits
                .parse()
                .map_err(|_| ParseError::UnknownWord(digits.to_string()))?;
            return Ok(Address::new(house, Unit::new(number)?));
        }
        Ok(word.parse()?)
    }

    /// An optional function mnemonic; consumed only when it parses.
    fn function_match(&mut self) -> FunctionMatch {
        match self.peek_word().map(str::parse::<Function>) {
            Some(Ok(function)) => {
                self.word();
                FunctionMatch::Only(function)
            }
            _ => FunctionMatch::Any,
        }
    }

    fn path(&self) -> Option<PathBuf> {
        let rest = self.rest();
        (!rest.is_empty()).then(|| PathBuf::from(rest))
    }
}
