//! Sound Lifespan Analyzer
//!
//! Groups videos by the sound they use (see [`VideoRecord::sound_key`]),
//! builds the usage timeline of one focus sound, and ranks every sound by
//! how much of its use falls inside the trending window.
//!
//! The trending window is measured back from an explicit `now`, which is
//! the only time-relative input of this module.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use super::{desc, OrderedGroups};
use crate::format::{mean, round_rate};
use crate::types::VideoRecord;

const TOP_TRENDING: usize = 10;

/// Parameters for [`analyze_sound_lifespan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundOptions {
    /// Restrict the analysis to one sound (id, or title for sounds
    /// without an id). Other sounds are excluded from every output.
    pub sound_id: Option<String>,
    /// Label echoed in the report
    pub username: Option<String>,
    pub trending_window_days: u32,
}

impl Default for SoundOptions {
    fn default() -> Self {
        Self {
            sound_id: None,
            username: None,
            trending_window_days: 30,
        }
    }
}

/// Direction of a sound's usage over its own lifespan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageTrend {
    Increasing,
    Stable,
    Decreasing,
}

impl UsageTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageTrend::Increasing => "increasing",
            UsageTrend::Stable => "stable",
            UsageTrend::Decreasing => "decreasing",
        }
    }
}

/// Timeline statistics for the focus sound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundAnalysis {
    pub sound_id: String,
    pub sound_title: String,
    /// Videos using the sound, with or without a creation time
    pub total_uses: usize,
    pub lifespan_days: i64,
    pub first_use: DateTime<Utc>,
    pub last_use: DateTime<Utc>,
    pub avg_engagement_rate: f64,
    pub total_views: u64,
    pub total_likes: u64,
    /// ISO week with the most uses, e.g. "2024-W07"
    pub peak_week: Option<String>,
    pub peak_week_uses: usize,
    pub usage_trend: UsageTrend,
}

/// A sound with at least one use inside the trending window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingSound {
    pub sound_id: String,
    pub sound_title: String,
    /// Uses with a creation time
    pub total_uses: usize,
    pub recent_uses: usize,
    pub avg_engagement_rate: f64,
    pub total_views: u64,
    /// `recent_uses / total_uses`
    pub trend_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundLifespanReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub sound_analysis: Option<SoundAnalysis>,
    pub trending_sounds: Vec<TrendingSound>,
    /// Distinct sounds after the optional `sound_id` filter
    pub sound_count: usize,
    pub total_videos_analyzed: usize,
}

/// Analyze sound usage relative to `now`.
pub fn analyze_sound_lifespan(
    records: &[VideoRecord],
    options: &SoundOptions,
    now: DateTime<Utc>,
) -> SoundLifespanReport {
    let mut sounds: OrderedGroups<String, Vec<&VideoRecord>> = OrderedGroups::new();
    for record in records {
        let key = record.sound_key();
        if let Some(wanted) = &options.sound_id {
            if &key != wanted {
                continue;
            }
        }
        sounds.entry(key).push(record);
    }

    let focus = options
        .sound_id
        .as_ref()
        .or_else(|| sounds.first_key())
        .and_then(|key| sounds.get(key).map(|videos| (key, videos)));
    let sound_analysis = focus.and_then(|(key, videos)| analyze_sound(key, videos));

    // A window reaching past the representable range has no cutoff
    let cutoff = now.checked_sub_signed(Duration::days(i64::from(options.trending_window_days)));
    let mut trending_sounds: Vec<TrendingSound> = sounds
        .iter()
        .filter_map(|(key, videos)| trending(key, videos, cutoff))
        .collect();
    trending_sounds.sort_by(|a, b| desc(a.trend_score, b.trend_score));
    trending_sounds.truncate(TOP_TRENDING);

    tracing::debug!(
        sounds = sounds.len(),
        trending = trending_sounds.len(),
        focus = ?sound_analysis.as_ref().map(|a| a.sound_id.as_str()),
        "Analyzed sound usage"
    );

    SoundLifespanReport {
        sound_id: options.sound_id.clone(),
        username: options.username.clone(),
        sound_analysis,
        trending_sounds,
        sound_count: sounds.len(),
        total_videos_analyzed: records.len(),
    }
}

fn analyze_sound(key: &str, videos: &[&VideoRecord]) -> Option<SoundAnalysis> {
    let timeline = sorted_timeline(videos);
    let (&first_use, &last_use) = (timeline.first()?, timeline.last()?);

    let mut weeks: OrderedGroups<String, usize> = OrderedGroups::new();
    for ts in &timeline {
        *weeks.entry(iso_week_key(*ts)) += 1;
    }
    let mut peak: Option<(&String, usize)> = None;
    for (week, &uses) in weeks.iter() {
        if peak.map_or(true, |(_, best)| uses > best) {
            peak = Some((week, uses));
        }
    }

    Some(SoundAnalysis {
        sound_id: key.to_string(),
        sound_title: sound_title(videos),
        total_uses: videos.len(),
        lifespan_days: (last_use - first_use).num_days(),
        first_use,
        last_use,
        avg_engagement_rate: round_rate(engagement(videos)),
        total_views: saturating_total(videos, |v| v.views_or_zero()),
        total_likes: saturating_total(videos, |v| v.likes.unwrap_or(0)),
        peak_week: peak.map(|(week, _)| week.clone()),
        peak_week_uses: peak.map_or(0, |(_, uses)| uses),
        usage_trend: usage_trend(&timeline),
    })
}

fn trending(
    key: &str,
    videos: &[&VideoRecord],
    cutoff: Option<DateTime<Utc>>,
) -> Option<TrendingSound> {
    let timeline = sorted_timeline(videos);
    let recent = timeline
        .iter()
        .filter(|ts| cutoff.map_or(true, |cutoff| **ts > cutoff))
        .count();
    if recent == 0 {
        return None;
    }

    Some(TrendingSound {
        sound_id: key.to_string(),
        sound_title: sound_title(videos),
        total_uses: timeline.len(),
        recent_uses: recent,
        avg_engagement_rate: round_rate(engagement(videos)),
        total_views: saturating_total(videos, |v| v.views_or_zero()),
        trend_score: round_rate(recent as f64 / timeline.len() as f64),
    })
}

/// Compare use counts either side of the lifespan midpoint.
///
/// Uses falling exactly on the midpoint count for neither half.
pub fn usage_trend(timeline: &[DateTime<Utc>]) -> UsageTrend {
    let (Some(&first), Some(&last)) = (timeline.first(), timeline.last()) else {
        return UsageTrend::Stable;
    };
    if timeline.len() < 2 || first == last {
        return UsageTrend::Stable;
    }

    let midpoint = first + (last - first) / 2;
    let earlier = timeline.iter().filter(|ts| **ts < midpoint).count();
    let later = timeline.iter().filter(|ts| **ts > midpoint).count();

    match later.cmp(&earlier) {
        std::cmp::Ordering::Greater => UsageTrend::Increasing,
        std::cmp::Ordering::Less => UsageTrend::Decreasing,
        std::cmp::Ordering::Equal => UsageTrend::Stable,
    }
}

/// ISO year-week key, e.g. "2024-W07".
pub fn iso_week_key(ts: DateTime<Utc>) -> String {
    let week = ts.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

fn sorted_timeline(videos: &[&VideoRecord]) -> Vec<DateTime<Utc>> {
    let mut timeline: Vec<_> = videos.iter().filter_map(|v| v.create_time).collect();
    timeline.sort();
    timeline
}

fn saturating_total(videos: &[&VideoRecord], count: impl Fn(&VideoRecord) -> u64) -> u64 {
    videos
        .iter()
        .map(|&v| count(v))
        .fold(0u64, u64::saturating_add)
}

fn engagement(videos: &[&VideoRecord]) -> f64 {
    let rates: Vec<f64> = videos.iter().map(|v| v.engagement_rate()).collect();
    mean(&rates)
}

fn sound_title(videos: &[&VideoRecord]) -> String {
    videos
        .iter()
        .find_map(|v| {
            v.music
                .as_ref()
                .and_then(|m| m.title.as_deref())
                .filter(|title| !title.trim().is_empty())
        })
        .unwrap_or("Unknown")
        .to_string()
}
