//! Combined analysis
//!
//! Runs every analyzer over one collection and bundles their payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use super::earnings::{estimate_earnings, EarningsAssumptions, EarningsEstimate, EarningsOptions};
use super::engagement::{summarize_engagement, EngagementSummary};
use super::hashtags::{score_hashtags, HashtagOptions, HashtagReport};
use super::posting_time::{optimize_posting_times, PostingTimeOptions, PostingTimeReport};
use super::sounds::{analyze_sound_lifespan, SoundLifespanReport, SoundOptions};
use crate::config::{AnalyticsConfig, Config};
use crate::types::VideoRecord;

/// Parameters shared by the analyzers of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub username: Option<String>,
    pub timezone: String,
    pub window_days: u32,
    pub min_hashtag_uses: usize,
    pub sound_id: Option<String>,
    pub trending_window_days: u32,
    pub earnings: EarningsAssumptions,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

impl ReportOptions {
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            username: None,
            timezone: config.timezone.clone(),
            window_days: config.window_days,
            min_hashtag_uses: config.min_hashtag_uses,
            sound_id: None,
            trending_window_days: config.trending_window_days,
            earnings: EarningsAssumptions::default(),
        }
    }

    /// Options from the `[analytics]` and `[earnings]` tables.
    pub fn from_full_config(config: &Config) -> Self {
        Self {
            earnings: config.earnings.clone(),
            ..Self::from_config(&config.analytics)
        }
    }

    pub fn posting_time(&self) -> PostingTimeOptions {
        PostingTimeOptions {
            username: self.username.clone(),
            timezone: self.timezone.clone(),
            window_days: self.window_days,
        }
    }

    pub fn hashtags(&self) -> HashtagOptions {
        HashtagOptions {
            username: self.username.clone(),
            min_uses: self.min_hashtag_uses,
        }
    }

    pub fn sounds(&self) -> SoundOptions {
        SoundOptions {
            sound_id: self.sound_id.clone(),
            username: self.username.clone(),
            trending_window_days: self.trending_window_days,
        }
    }

    pub fn earnings(&self) -> EarningsOptions {
        EarningsOptions {
            username: self.username.clone(),
            assumptions: self.earnings.clone(),
        }
    }
}

/// All analyzer payloads for one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub records_analyzed: usize,
    pub engagement: EngagementSummary,
    pub posting_times: PostingTimeReport,
    pub hashtags: HashtagReport,
    pub sounds: SoundLifespanReport,
    pub earnings: EarningsEstimate,
}

/// Run every analyzer over `records`.
pub fn run_report(records: &[VideoRecord], options: &ReportOptions, now: DateTime<Utc>) -> Report {
    tracing::info!(
        records = records.len(),
        username = options.username.as_deref().unwrap_or(""),
        "Building report"
    );

    let engagement = timed("engagement", || summarize_engagement(records));
    let posting_times = timed("posting_times", || {
        optimize_posting_times(records, &options.posting_time())
    });
    let hashtags = timed("hashtags", || score_hashtags(records, &options.hashtags()));
    let sounds = timed("sounds", || {
        analyze_sound_lifespan(records, &options.sounds(), now)
    });
    let earnings = timed("earnings", || estimate_earnings(records, &options.earnings()));

    Report {
        username: options.username.clone(),
        records_analyzed: records.len(),
        engagement,
        posting_times,
        hashtags,
        sounds,
        earnings,
    }
}

fn timed<T>(stage: &str, run: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = run();
    tracing::debug!(
        stage,
        duration_ms = start.elapsed().as_millis() as u64,
        "Report stage completed"
    );
    result
}
