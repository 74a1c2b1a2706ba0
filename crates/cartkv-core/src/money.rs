//! Integer-cent arithmetic for item costs.
//!
//! Unit costs are truncated to whole cents before any multiplication, so a
//! cart total is an exact sum of integers no matter how many items it holds.
//! Field values are parsed leniently: the longest numeric prefix counts, and
//! anything unparseable is zero.

use std::str::FromStr;

use cartkv_types::FieldValue;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Unit cost in whole cents: `truncate(decimal * 100)`.
pub fn unit_cost_cents(value: Option<&FieldValue>) -> i64 {
    let Some(value) = value else { return 0 };
    let text = value.to_text();
    let Ok(decimal) = Decimal::from_str(&decimal_prefix(&text)) else {
        return 0;
    };
    decimal
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_i64())
        .unwrap_or(0)
}

/// Quantity as an integer; the fractional part of a decimal is dropped.
pub fn quantity(value: Option<&FieldValue>) -> i64 {
    let Some(value) = value else { return 0 };
    let text = value.to_text();
    integer_prefix(&text).parse().unwrap_or(0)
}

/// Convert cents to a currency amount.
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Render cents with exactly two decimals, e.g. `2998` as `29.98`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

fn integer_prefix(text: &str) -> &str {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    &text[..end]
}

/// The leading decimal number of `text`, normalized so `.5` reads `0.5` and
/// a trailing `.` is dropped.
fn decimal_prefix(text: &str) -> String {
    let whole = integer_prefix(text);
    let rest = &text.trim_start()[whole.len()..];
    let (sign, digits) = match whole.as_bytes().first() {
        Some(b'+' | b'-') => whole.split_at(1),
        _ => ("", whole),
    };
    let fraction: &str = rest
        .strip_prefix('.')
        .map(|f| &f[..f.bytes().take_while(u8::is_ascii_digit).count()])
        .unwrap_or("");
    if digits.is_empty() && fraction.is_empty() {
        return String::new();
    }
    let digits = if digits.is_empty() { "0" } else { digits };
    if fraction.is_empty() {
        format!("{sign}{digits}")
    } else {
        format!("{sign}{digits}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::from(s)
    }

    #[test]
    fn unit_cost_truncates_to_cents() {
        assert_eq!(unit_cost_cents(Some(&text("2.50"))), 250);
        assert_eq!(unit_cost_cents(Some(&text("9.99"))), 999);
        assert_eq!(unit_cost_cents(Some(&text("1.009"))), 100);
        assert_eq!(unit_cost_cents(Some(&text("3"))), 300);
        assert_eq!(unit_cost_cents(Some(&text("-1.5"))), -150);
        assert_eq!(unit_cost_cents(Some(&text(" 4.25 each"))), 425);
        assert_eq!(unit_cost_cents(Some(&text(".5"))), 50);
        assert_eq!(unit_cost_cents(Some(&text("3."))), 300);
    }

    #[test]
    fn unit_cost_from_numbers() {
        assert_eq!(unit_cost_cents(Some(&FieldValue::Float(9.99))), 999);
        assert_eq!(unit_cost_cents(Some(&FieldValue::Float(0.1))), 10);
        assert_eq!(unit_cost_cents(Some(&FieldValue::Int(7))), 700);
    }

    #[test]
    fn unit_cost_garbage_is_zero() {
        assert_eq!(unit_cost_cents(None), 0);
        assert_eq!(unit_cost_cents(Some(&FieldValue::Null)), 0);
        assert_eq!(unit_cost_cents(Some(&text("free"))), 0);
        assert_eq!(unit_cost_cents(Some(&text(""))), 0);
        assert_eq!(unit_cost_cents(Some(&FieldValue::Float(f64::NAN))), 0);
    }

    #[test]
    fn quantity_parses_integer_prefix() {
        assert_eq!(quantity(Some(&text("3"))), 3);
        assert_eq!(quantity(Some(&text("10 boxes"))), 10);
        assert_eq!(quantity(Some(&text("2.7"))), 2);
        assert_eq!(quantity(Some(&FieldValue::Int(4))), 4);
        assert_eq!(quantity(Some(&FieldValue::Float(2.7))), 2);
        assert_eq!(quantity(Some(&text("-2"))), -2);
        assert_eq!(quantity(Some(&text("many"))), 0);
        assert_eq!(quantity(Some(&FieldValue::Null)), 0);
        assert_eq!(quantity(None), 0);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_cents(2998), "29.98");
        assert_eq!(format_cents(750), "7.50");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-150), "-1.50");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(cents_to_amount(2998), 29.98);
    }

    proptest! {
        #[test]
        fn two_decimal_strings_parse_exactly(whole in 0i64..1_000_000, frac in 0i64..100) {
            let value = text(&format!("{whole}.{frac:02}"));
            prop_assert_eq!(unit_cost_cents(Some(&value)), whole * 100 + frac);
        }

        #[test]
        fn amount_matches_formatted_cents(cents in -10_000_000i64..10_000_000) {
            let parsed: f64 = format_cents(cents).parse().unwrap();
            prop_assert_eq!(cents_to_amount(cents), parsed);
        }

        #[test]
        fn parsing_never_panics(s in ".*") {
            let value = text(&s);
            let _ = unit_cost_cents(Some(&value));
            let _ = quantity(Some(&value));
        }
    }
}
