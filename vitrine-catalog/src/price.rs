use std::fmt;

use serde::{Deserialize, Serialize};

const CURRENCY_PREFIX: &str = "R$ ";

/// A price as shown to customers, e.g. `"R$ 1.234,56"`.
///
/// The catalog stores the formatted text, not an amount. Use
/// [`Price::from_digits`] to build one from user keystrokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    /// Wraps an already formatted price.
    pub fn new(formatted: impl Into<String>) -> Self {
        Price(formatted.into())
    }

    /// Formats raw input as Brazilian reais.
    ///
    /// Every non-digit is dropped and the remaining digits are read as
    /// cents, so `"12345"`, `"123,45"` and `"R$ 123,45"` all give
    /// `"R$ 123,45"`. Returns None when the input has no digits.
    pub fn from_digits(input: &str) -> Option<Self> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }

        let padded = format!("{:0>3}", digits);
        let (whole, cents) = padded.split_at(padded.len() - 2);
        let whole = whole.trim_start_matches('0');
        let whole = if whole.is_empty() { "0" } else { whole };

        Some(Price(format!(
            "{}{},{}",
            CURRENCY_PREFIX,
            group_thousands(whole),
            cents
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Price {
    fn from(formatted: &str) -> Self {
        Price::new(formatted)
    }
}
