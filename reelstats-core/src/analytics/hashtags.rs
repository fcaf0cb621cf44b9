//! Hashtag Efficacy Scorer
//!
//! Compares the mean engagement of the videos carrying each tag against
//! the collection baseline.
//!
//! ```text
//! baseline = mean(engagement_rate) over all videos
//! lift     = (mean(tag videos) - baseline) / baseline    (0 when baseline is 0)
//! ```
//!
//! Only tags carried by at least `min_uses` videos are ranked. Two rankings
//! of those tags are emitted independently: by lift, and by raw usage.

use serde::Serialize;

use super::{desc, OrderedGroups};
use crate::format::{mean, round_pct, round_rate};
use crate::types::VideoRecord;

const TOP_SCORES: usize = 20;
const TOP_USAGE: usize = 20;

/// Parameters for [`score_hashtags`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagOptions {
    /// Label echoed in the report
    pub username: Option<String>,
    /// Tags used by fewer videos are not scored
    pub min_uses: usize,
}

impl Default for HashtagOptions {
    fn default() -> Self {
        Self {
            username: None,
            min_uses: 5,
        }
    }
}

/// Lift of one tag against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagScore {
    pub hashtag: String,
    pub avg_engagement_rate: f64,
    pub baseline_engagement: f64,
    pub lift_percentage: f64,
    pub video_count: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
}

/// Raw usage of one tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagUsage {
    pub hashtag: String,
    pub usage_count: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub avg_views_per_video: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Tags meeting the usage threshold, by descending lift
    pub scores: Vec<HashtagScore>,
    /// Tags meeting the usage threshold, by descending usage count
    pub top_hashtags: Vec<HashtagUsage>,
    /// Distinct tags seen, regardless of threshold
    pub hashtag_count: usize,
    pub baseline_engagement: f64,
    pub total_videos_analyzed: usize,
}

#[derive(Debug, Default)]
struct TagStats {
    rates: Vec<f64>,
    views: u64,
    likes: u64,
    comments: u64,
    shares: u64,
}

impl TagStats {
    fn add(&mut self, record: &VideoRecord, rate: f64) {
        self.rates.push(rate);
        self.views = self.views.saturating_add(record.views.unwrap_or(0));
        self.likes = self.likes.saturating_add(record.likes.unwrap_or(0));
        self.comments = self.comments.saturating_add(record.comments.unwrap_or(0));
        self.shares = self.shares.saturating_add(record.shares.unwrap_or(0));
    }
}

/// Score every tag against the collection baseline.
pub fn score_hashtags(records: &[VideoRecord], options: &HashtagOptions) -> HashtagReport {
    let mut tags: OrderedGroups<String, TagStats> = OrderedGroups::new();
    let mut rates = Vec::with_capacity(records.len());

    for record in records {
        let rate = record.engagement_rate();
        rates.push(rate);
        for tag in record.canonical_hashtags() {
            tags.entry(tag).add(record, rate);
        }
    }

    let baseline = mean(&rates);

    let qualified: Vec<(&String, &TagStats)> = tags
        .iter()
        .filter(|(_, stats)| stats.rates.len() >= options.min_uses)
        .collect();

    let mut scores: Vec<HashtagScore> = qualified
        .iter()
        .map(|&(tag, stats)| {
            let avg = mean(&stats.rates);
            HashtagScore {
                hashtag: tag.clone(),
                avg_engagement_rate: round_rate(avg),
                baseline_engagement: round_rate(baseline),
                lift_percentage: round_pct(lift(avg, baseline) * 100.0),
                video_count: stats.rates.len(),
                total_views: stats.views,
                total_likes: stats.likes,
                total_comments: stats.comments,
                total_shares: stats.shares,
            }
        })
        .collect();
    scores.sort_by(|a, b| desc(a.lift_percentage, b.lift_percentage));
    scores.truncate(TOP_SCORES);

    let mut top_hashtags: Vec<HashtagUsage> = qualified
        .iter()
        .map(|&(tag, stats)| HashtagUsage {
            hashtag: tag.clone(),
            usage_count: stats.rates.len(),
            total_views: stats.views,
            total_likes: stats.likes,
            avg_views_per_video: round_pct(stats.views as f64 / stats.rates.len() as f64),
        })
        .collect();
    top_hashtags.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
    top_hashtags.truncate(TOP_USAGE);

    tracing::debug!(
        tags = tags.len(),
        scored = scores.len(),
        min_uses = options.min_uses,
        baseline,
        "Scored hashtags"
    );

    HashtagReport {
        username: options.username.clone(),
        scores,
        top_hashtags,
        hashtag_count: tags.len(),
        baseline_engagement: round_rate(baseline),
        total_videos_analyzed: records.len(),
    }
}

/// Relative difference from the baseline, 0 when the baseline is 0.
fn lift(avg: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (avg - baseline) / baseline
    } else {
        0.0
    }
}
