//! Formatting helpers shared by the analytics payloads and the CLI.

use chrono::{DateTime, Utc};

/// Round to a fixed number of decimal places.
///
/// Non-finite input yields 0.0 so payloads never carry NaN or infinity.
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Rates are reported with 4 decimal places.
pub fn round_rate(value: f64) -> f64 {
    round_to(value, 4)
}

/// Percentages and averages are reported with 2 decimal places.
pub fn round_pct(value: f64) -> f64 {
    round_to(value, 2)
}

/// Dollar amounts are reported to the cent.
pub fn round_money(value: f64) -> f64 {
    round_to(value, 2)
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Compact count display (e.g., "14.2M", "3.4K", "950").
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000_000 {
        format!("{:.1}B", count as f64 / 1_000_000_000.0)
    } else if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Render a dollar amount with thousands separators (e.g., "$12,345.60").
pub fn format_money(amount: f64) -> String {
    let rounded = round_money(amount);
    let cents = format!("{:.2}", rounded.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, fraction)
}

/// Render an engagement rate as a percentage (e.g., "12.34%").
pub fn format_rate_pct(rate: f64) -> String {
    format!("{:.2}%", round_to(rate * 100.0, 2))
}

/// Format a timestamp relative to `now` (e.g., "2d ago").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "in the future".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d, %Y").to_string()
    }
}
