//! Action template — the shell command a trigger rule runs.
//!
//! Templates may reference the event that fired them:
//!
//! | Placeholder | Replaced with |
//! |-------------|---------------|
//! | `%h` | house letter (`A`..=`P`) |
//! | `%u` | unit number (`1`..=`16`) |
//! | `%f` | function mnemonic (`ON`, `OFF`, …) |
//! | `%d` | device description |
//!
//! Any other `%` sequence is copied verbatim, so `date +%H` survives.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TemplateError;
use crate::function::Function;

/// Default upper bound, in bytes, on a rendered action.
pub const DEFAULT_ACTION_CAPACITY: usize = 256;

/// Values substituted into an [`ActionTemplate`].
#[derive(Debug, Clone, Copy)]
pub struct Substitution<'a> {
    pub address: Address,
    pub function: Function,
    pub description: &'a str,
}

/// Command text with `%h/%u/%f/%d` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTemplate(String);

impl ActionTemplate {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Expand placeholders into a command of at most `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Overflow`] when the expansion would exceed
    /// `capacity`; nothing is truncated.
    pub fn render(
        &self,
        values: &Substitution<'_>,
        capacity: usize,
    ) -> Result<String, TemplateError> {
        let mut out = BoundedString::new(capacity);
        let mut chars = self.0.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push_char(c)?;
                continue;
            }
            match chars.peek() {
                Some('h') => out.push_char(values.address.house.letter())?,
                Some('u') => out.push_str(&values.address.unit.to_string())?,
                Some('f') => out.push_str(values.function.mnemonic())?,
                Some('d') => out.push_str(values.description)?,
                _ => {
                    out.push_char('%')?;
                    continue;
                }
            }
            chars.next();
        }
        Ok(out.into_inner())
    }
}

impl std::fmt::Display for ActionTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

struct BoundedString {
    inner: String,
    capacity: usize,
}

impl BoundedString {
    fn new(capacity: usize) -> Self {
        Self {
            inner: String::new(),
            capacity,
        }
    }

    fn push_str(&mut self, s: &str) -> Result<(), TemplateError> {
        if self.inner.len() + s.len() > self.capacity {
            return Err(TemplateError::Overflow {
                capacity: self.capacity,
            });
        }
        self.inner.push_str(s);
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<(), TemplateError> {
        let mut buf = [0u8; 4];
        self.push_str(c.encode_utf8(&mut buf))
    }

    fn into_inner(self) -> String {
        self.inner
    }
}
