//! Display formatting for amounts. Values are rounded only here.

/// Thai baht with two decimals and thousands separators, e.g. `฿1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let body = format_number(amount.abs(), 2);
    if amount < 0.0 && body.chars().any(|ch| ch.is_ascii_digit() && ch != '0') {
        format!("-฿{body}")
    } else {
        format!("฿{body}")
    }
}

/// Fixed decimals with comma thousands separators. Non-finite values print as zero.
pub fn format_number(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|ch| ch.is_ascii_digit() && ch != '0');
    let sign = if negative { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
        assert_eq!(format_number(-1500.5, 1), "-1,500.5");
    }

    #[test]
    fn currency_rounds_for_display() {
        assert_eq!(format_currency(19.600000000000001), "฿19.60");
        assert_eq!(format_currency(0.0), "฿0.00");
        assert_eq!(format_currency(-0.001), "฿0.00");
        assert_eq!(format_currency(-12.5), "-฿12.50");
    }

    #[test]
    fn non_finite_prints_zero() {
        assert_eq!(format_number(f64::NAN, 2), "0.00");
    }
}
