/// Group digits in thousands: `1250000` -> `1,250,000`.
pub fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Whole-unit money with the currency symbol, e.g. `$125,000`.
pub fn format_money(value: i64, currency_symbol: &str) -> String {
    let grouped = format_grouped_int(value);
    match grouped.strip_prefix('-') {
        Some(digits) => format!("-{currency_symbol}{digits}"),
        None => format!("{currency_symbol}{grouped}"),
    }
}

/// `part / whole` as a whole percentage; 0% when `whole` is zero.
pub fn format_percent(part: i64, whole: i64) -> String {
    if whole == 0 {
        return "0%".to_string();
    }
    format!("{:.0}%", part as f64 * 100.0 / whole as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_grouped_int(0), "0");
        assert_eq!(format_grouped_int(999), "999");
        assert_eq!(format_grouped_int(1250), "1,250");
        assert_eq!(format_grouped_int(-1250000), "-1,250,000");
    }

    #[test]
    fn money_and_percent() {
        assert_eq!(format_money(125000, "$"), "$125,000");
        assert_eq!(format_money(-40, "$"), "-$40");
        assert_eq!(format_percent(1, 2), "50%");
        assert_eq!(format_percent(5, 0), "0%");
    }

    #[test]
    fn money_at_i64_min() {
        assert_eq!(format_money(i64::MIN, "$"), "-$9,223,372,036,854,775,808");
    }
}
