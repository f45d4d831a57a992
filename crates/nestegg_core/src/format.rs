//! Human-readable amounts for recommendation and insight messages

fn group_thousands(dollars: u64) -> String {
    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Whole dollars with thousands separators, e.g. `$1,250,000`
pub fn format_currency(value: f64) -> String {
    let dollars = group_thousands(value.abs().round() as u64);
    if value < 0.0 && value.abs().round() > 0.0 {
        format!("-${dollars}")
    } else {
        format!("${dollars}")
    }
}

/// Fraction as a percentage with one decimal, e.g. `0.35` -> `35.0%`
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Compact form for headlines, e.g. `$2.1M`, `$450K`
pub fn format_compact_currency(value: f64) -> String {
    let abs_value = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs_value >= 1_000_000.0 {
        format!("{sign}${:.1}M", abs_value / 1_000_000.0)
    } else if abs_value >= 1_000.0 {
        format!("{sign}${:.0}K", abs_value / 1_000.0)
    } else {
        format!("{sign}${abs_value:.0}")
    }
}
