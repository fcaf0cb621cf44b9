//! Time-Window Optimizer
//!
//! Ranks `(day, hour)` posting windows, days and hours by the mean
//! engagement rate of the videos published in them.
//!
//! Timestamps are converted into the requested IANA timezone before
//! bucketing. Every group needs at least [`MIN_SAMPLES`] videos to be
//! reported.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use super::{desc, OrderedGroups};
use crate::format::{mean, round_rate};
use crate::types::VideoRecord;

/// Minimum number of videos behind any reported window, day or hour.
pub const MIN_SAMPLES: usize = 2;

const TOP_WINDOWS: usize = 10;

/// Parameters for [`optimize_posting_times`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingTimeOptions {
    /// Label echoed in the report
    pub username: Option<String>,
    /// IANA timezone name used for bucketing
    pub timezone: String,
    /// Informational; recorded in the report, not used to filter
    pub window_days: u32,
}

impl Default for PostingTimeOptions {
    fn default() -> Self {
        Self {
            username: None,
            timezone: "UTC".to_string(),
            window_days: 60,
        }
    }
}

/// A `(day, hour)` posting window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub day: String,
    pub hour: u32,
    pub avg_engagement_rate: f64,
    pub video_count: usize,
    /// Display label, e.g. "Monday 11:00"
    pub time_slot: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPerformance {
    pub day: String,
    pub avg_engagement_rate: f64,
    pub video_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourPerformance {
    pub hour: u32,
    pub avg_engagement_rate: f64,
    pub video_count: usize,
}

/// Ranked posting windows for one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingTimeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub windows: Vec<TimeWindow>,
    pub best_days: Vec<DayPerformance>,
    pub best_hours: Vec<HourPerformance>,
    /// Timezone actually used for bucketing
    pub timezone: String,
    pub analysis_period_days: u32,
    /// Videos that carried a creation time
    pub total_videos_analyzed: usize,
}

/// Rank posting windows by mean engagement.
pub fn optimize_posting_times(
    records: &[VideoRecord],
    options: &PostingTimeOptions,
) -> PostingTimeReport {
    let (tz, timezone) = resolve_timezone(&options.timezone);

    let mut windows: OrderedGroups<(Weekday, u32), Vec<f64>> = OrderedGroups::new();
    let mut days: OrderedGroups<Weekday, Vec<f64>> = OrderedGroups::new();
    let mut hours: OrderedGroups<u32, Vec<f64>> = OrderedGroups::new();
    let mut analyzed = 0;

    for record in records {
        let Some(created) = record.create_time else {
            continue;
        };
        let (day, hour) = local_slot(created, tz);
        let rate = record.engagement_rate();

        windows.entry((day, hour)).push(rate);
        days.entry(day).push(rate);
        hours.entry(hour).push(rate);
        analyzed += 1;
    }

    let mut best_windows: Vec<TimeWindow> = windows
        .iter()
        .filter(|(_, rates)| rates.len() >= MIN_SAMPLES)
        .map(|(&(day, hour), rates)| TimeWindow {
            day: day_name(day).to_string(),
            hour,
            avg_engagement_rate: round_rate(mean(rates)),
            video_count: rates.len(),
            time_slot: format!("{} {:02}:00", day_name(day), hour),
        })
        .collect();
    best_windows.sort_by(|a, b| desc(a.avg_engagement_rate, b.avg_engagement_rate));
    best_windows.truncate(TOP_WINDOWS);

    let mut best_days: Vec<DayPerformance> = days
        .iter()
        .filter(|(_, rates)| rates.len() >= MIN_SAMPLES)
        .map(|(&day, rates)| DayPerformance {
            day: day_name(day).to_string(),
            avg_engagement_rate: round_rate(mean(rates)),
            video_count: rates.len(),
        })
        .collect();
    best_days.sort_by(|a, b| desc(a.avg_engagement_rate, b.avg_engagement_rate));

    let mut best_hours: Vec<HourPerformance> = hours
        .iter()
        .filter(|(_, rates)| rates.len() >= MIN_SAMPLES)
        .map(|(&hour, rates)| HourPerformance {
            hour,
            avg_engagement_rate: round_rate(mean(rates)),
            video_count: rates.len(),
        })
        .collect();
    best_hours.sort_by(|a, b| desc(a.avg_engagement_rate, b.avg_engagement_rate));

    tracing::debug!(
        analyzed,
        windows = best_windows.len(),
        timezone = %timezone,
        "Ranked posting windows"
    );

    PostingTimeReport {
        username: options.username.clone(),
        windows: best_windows,
        best_days,
        best_hours,
        timezone,
        analysis_period_days: options.window_days,
        total_videos_analyzed: analyzed,
    }
}

/// Parse an IANA timezone label, falling back to UTC.
fn resolve_timezone(label: &str) -> (Tz, String) {
    match label.trim().parse::<Tz>() {
        Ok(tz) => (tz, tz.name().to_string()),
        Err(_) => {
            tracing::warn!(timezone = label, "Unknown timezone, using UTC");
            (Tz::UTC, "UTC".to_string())
        }
    }
}

fn local_slot(ts: DateTime<Utc>, tz: Tz) -> (Weekday, u32) {
    let local = ts.with_timezone(&tz);
    (local.weekday(), local.hour())
}

/// Full English day name.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
