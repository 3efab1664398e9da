use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::BalanceSnapshot;

/// Shown in place of a balance that could not be loaded
pub const BALANCE_UNAVAILABLE: &str = "Not available";

/// Format an amount with its currency symbol and thousands separators.
/// Unknown currencies are prefixed with their code.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let code = currency.trim().to_ascii_uppercase();
    let (symbol, decimals) = match code.as_str() {
        "USD" => ("$", 2),
        "EUR" => ("€", 2),
        "GBP" => ("£", 2),
        "JPY" => ("¥", 0),
        _ => ("", 2),
    };

    let rounded = amount
        .abs()
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", decimals as usize, rounded);
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut out = String::new();
    if amount < Decimal::ZERO && !rounded.is_zero() {
        out.push('-');
    }
    if symbol.is_empty() {
        out.push_str(&code);
        out.push(' ');
    } else {
        out.push_str(symbol);
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Balance line for the account overview
pub fn balance_display(snapshot: Option<&BalanceSnapshot>) -> String {
    match snapshot {
        Some(s) => format_currency(s.balance, &s.currency),
        None => BALANCE_UNAVAILABLE.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::new(123456, 2), "USD"), "$1,234.56");
        assert_eq!(format_currency(Decimal::new(5, 0), "eur"), "€5.00");
        assert_eq!(format_currency(Decimal::new(-1050, 2), "GBP"), "-£10.50");
        assert_eq!(format_currency(Decimal::new(1234567, 0), "JPY"), "¥1,234,567");
        assert_eq!(format_currency(Decimal::new(999, 3), "CHF"), "CHF 1.00");
        assert_eq!(format_currency(Decimal::new(12345, 3), "USD"), "$12.35"); // half rounds up
        assert_eq!(format_currency(Decimal::ZERO, "USD"), "$0.00");
    }

    #[test]
    fn test_balance_display() {
        assert_eq!(balance_display(None), "Not available");
        let snapshot = BalanceSnapshot {
            account_id: "acc-1".to_string(),
            balance: Decimal::new(100000, 2),
            currency: "USD".to_string(),
        };
        assert_eq!(balance_display(Some(&snapshot)), "$1,000.00");
    }
}
