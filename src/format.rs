//! Pure display formatting for numeric cell values and summary figures.

/// Format an integer with thousands separators.
pub fn format_integer(value: i64) -> String {
    let grouped = group_digits(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format a float with thousands separators and at most two decimal places.
/// Whole values render without decimals; fractional values are not padded
/// with trailing zeros.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs();
    let fixed = format!("{:.2}", magnitude);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    let (int_digits, frac_digits) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (trimmed, None),
    };

    let mut out = group_digits(int_digits);
    if let Some(frac) = frac_digits {
        out.push('.');
        out.push_str(frac);
    }
    if value < 0.0 && out != "0" {
        out.insert(0, '-');
    }
    out
}

/// Format a JSON number, keeping exact integers grouped and without decimals.
pub fn format_json_number(value: &serde_json::Number) -> String {
    if let Some(i) = value.as_i64() {
        return format_integer(i);
    }
    if let Some(u) = value.as_u64() {
        return group_digits(&u.to_string());
    }
    value
        .as_f64()
        .map(format_number)
        .unwrap_or_else(|| value.to_string())
}

/// Format a value expressed in millions as a currency figure, e.g. `$2686.18M`.
pub fn format_currency_millions(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${:.2}M", v),
        None => "N/A".to_string(),
    }
}

/// Format a ratio as a percentage with one decimal place, e.g. `52.1%`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "N/A".to_string(),
    }
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_group_thousands() {
        assert_eq!(format_integer(500), "500");
        assert_eq!(format_integer(2686), "2,686");
        assert_eq!(format_integer(1_234_567), "1,234,567");
        assert_eq!(format_integer(-1_234), "-1,234");
    }

    #[test]
    fn floats_keep_at_most_two_decimals() {
        assert_eq!(format_number(2686.18), "2,686.18");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(3.14159), "3.14");
        assert_eq!(format_number(-1234.5), "-1,234.5");
    }

    #[test]
    fn whole_floats_drop_decimals() {
        assert_eq!(format_number(500.0), "500");
        assert_eq!(format_number(12_000.0), "12,000");
        assert_eq!(format_number(2.999), "3");
    }

    #[test]
    fn json_numbers_route_by_kind() {
        let serde_json::Value::Number(int) = serde_json::json!(500) else {
            panic!("expected a number");
        };
        let serde_json::Value::Number(float) = serde_json::json!(2686.18) else {
            panic!("expected a number");
        };
        assert_eq!(format_json_number(&int), "500");
        assert_eq!(format_json_number(&float), "2,686.18");
    }

    #[test]
    fn currency_and_percent() {
        assert_eq!(format_currency_millions(Some(2686.18)), "$2686.18M");
        assert_eq!(format_currency_millions(None), "N/A");
        assert_eq!(format_percent(Some(0.5213)), "52.1%");
        assert_eq!(format_percent(None), "N/A");
    }
}
