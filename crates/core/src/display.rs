//! Amounts as the user sees and types them.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::errors::CoreError;

/// Render an amount for display: thousands separated by spaces, two decimals
/// only when there is a fractional part, `-` in front of negatives.
///
/// `1234567` → `"1 234 567"`, `-1234.5` → `"-1 234.50"`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let integer = rounded.trunc();
    let fraction = rounded - integer;

    let mut out = String::new();
    if amount.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_thousands(&integer.to_string()));
    if !fraction.is_zero() {
        let cents = (fraction * Decimal::ONE_HUNDRED).trunc().to_string();
        out.push('.');
        if cents.len() < 2 {
            out.push('0');
        }
        out.push_str(&cents);
    }
    out
}

/// Parse a user-typed amount. Spaces are ignored and `,` is accepted as the
/// decimal separator. Anything that is not a positive decimal is `InvalidAmount`.
pub fn parse_amount(input: &str) -> Result<Decimal, CoreError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| CoreError::InvalidAmount(format!("'{}' is not a number", input.trim())))?;
    if amount <= Decimal::ZERO {
        return Err(CoreError::InvalidAmount(format!("{amount} must be greater than zero")));
    }
    Ok(amount)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn groups_integer_part() {
        assert_eq!(format_amount(dec!(1234567)), "1 234 567");
        assert_eq!(format_amount(dec!(999)), "999");
        assert_eq!(format_amount(dec!(1000)), "1 000");
    }

    #[test]
    fn shows_cents_only_when_fractional() {
        assert_eq!(format_amount(dec!(1234.5)), "1 234.50");
        assert_eq!(format_amount(dec!(10.00)), "10");
        assert_eq!(format_amount(dec!(0.07)), "0.07");
    }

    #[test]
    fn negative_amounts_keep_sign() {
        assert_eq!(format_amount(dec!(-1500.25)), "-1 500.25");
        assert_eq!(format_amount(dec!(-0.001)), "0");
    }

    #[test]
    fn parse_accepts_comma_and_spaces() {
        assert_eq!(parse_amount(" 1 500,75 ").unwrap(), dec!(1500.75));
        assert_eq!(parse_amount("42").unwrap(), dec!(42));
    }

    #[test]
    fn parse_rejects_non_positive_and_garbage() {
        assert!(matches!(parse_amount("0"), Err(CoreError::InvalidAmount(_))));
        assert!(matches!(parse_amount("-3"), Err(CoreError::InvalidAmount(_))));
        assert!(matches!(parse_amount("abc"), Err(CoreError::InvalidAmount(_))));
        assert!(matches!(parse_amount(""), Err(CoreError::InvalidAmount(_))));
    }
}
