//! Amount entry keypad
//!
//! Mirrors the on-screen keypad: digits and a single decimal point, a
//! length cap, backspace and a max shortcut. The buffer is kept as the
//! typed string so "150." stays editable; it only becomes a number in
//! `value()`.

use rust_decimal::Decimal;

use crate::money::parse_amount;

#[derive(Debug, Clone)]
pub struct AmountInput {
    raw: String,
    max_len: usize,
}

impl AmountInput {
    pub fn new(max_len: usize) -> Self {
        Self {
            raw: String::new(),
            max_len,
        }
    }

    /// Append a digit. Non-digits and presses past the cap are ignored.
    pub fn press_digit(&mut self, digit: char) {
        if !digit.is_ascii_digit() || self.raw.len() >= self.max_len {
            return;
        }
        self.raw.push(digit);
    }

    /// Append the decimal point. Needs at least one digit first and at
    /// most one point per amount.
    pub fn press_decimal(&mut self) {
        if self.raw.is_empty() || self.raw.contains('.') || self.raw.len() >= self.max_len {
            return;
        }
        self.raw.push('.');
    }

    pub fn backspace(&mut self) {
        self.raw.pop();
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Replace the buffer with the full available balance
    pub fn set_max(&mut self, available: Decimal) {
        let clamped = available.max(Decimal::ZERO);
        self.raw = clamped.normalize().to_string();
    }

    pub fn text(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The entered amount, if the buffer parses. A trailing point is
    /// treated as "150." meaning 150.
    pub fn value(&self) -> Option<Decimal> {
        let raw = self.raw.strip_suffix('.').unwrap_or(&self.raw);
        parse_amount(raw)
    }
}
