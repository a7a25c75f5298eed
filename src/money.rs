//! INR amount helpers
//!
//! All money values are `rust_decimal::Decimal`. Amounts are rounded to the
//! paisa (two places) for display and comparison; arithmetic stays exact.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a user-entered amount string.
///
/// Empty, malformed or negative input yields `None`, never a panic.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() || s == "." {
        return None;
    }
    let value: Decimal = s.parse().ok()?;
    if value.is_sign_negative() {
        return None;
    }
    Some(value)
}

/// Round to the paisa (two decimal places, half away from zero)
pub fn to_paise(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as INR with Indian digit grouping.
///
/// `123456.7` renders as `₹1,23,456.70`: the last three integer digits form
/// one group, every group above that holds two digits.
pub fn format_inr(value: Decimal) -> String {
    let rounded = to_paise(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let units = abs.trunc();
    let paise = ((abs - units) * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u32()
        .unwrap_or(0);
    let grouped = group_indian(&units.normalize().to_string());
    if negative {
        format!("-₹{}.{:02}", grouped, paise)
    } else {
        format!("₹{}.{:02}", grouped, paise)
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut parts: Vec<&str> = Vec::new();
    let mut i = head.len();
    while i > 2 {
        parts.push(&head[i - 2..i]);
        i -= 2;
    }
    parts.push(&head[..i]);
    parts.reverse();
    format!("{},{}", parts.join(","), tail)
}
