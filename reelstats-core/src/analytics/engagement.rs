//! Engagement Aggregator
//!
//! Cohort-level engagement for a record collection.
//!
//! ## Payload
//!
//! | Field | Description |
//! |-------|-------------|
//! | `overall.videos` | Records in the collection |
//! | `overall.avgEngagementRate` | Mean per-record engagement rate |
//! | `overall.avgViews` | Mean views (unknown counts as 0) |
//! | `overall.shareToView` | Mean of `shares / max(1, views)` |
//! | `overall.commentToView` | Mean of `comments / max(1, views)` |
//! | `byHashtag` | Mean rate per canonical tag, best first, top 50 |
//! | `topVideos` | Records by descending rate, top 10 |

use serde::Serialize;

use super::{desc, OrderedGroups};
use crate::format::{mean, round_pct, round_rate, round_to};
use crate::types::VideoRecord;

const TOP_VIDEOS: usize = 10;
const TOP_HASHTAGS: usize = 50;

/// Summary over a whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSummary {
    pub overall: OverallEngagement,
    pub by_hashtag: Vec<HashtagEngagement>,
    pub top_videos: Vec<TopVideo>,
}

/// Collection-wide means. All zero for an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallEngagement {
    pub videos: usize,
    pub avg_engagement_rate: f64,
    pub avg_views: f64,
    pub share_to_view: f64,
    pub comment_to_view: f64,
}

/// Mean engagement of the videos carrying one tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagEngagement {
    pub hashtag: String,
    pub avg_engagement_rate: f64,
    pub video_count: usize,
}

/// One entry of the top-videos ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopVideo {
    pub identity_key: Option<String>,
    pub url: Option<String>,
    pub engagement_rate: f64,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub shares: Option<u64>,
}

impl TopVideo {
    fn from_record(record: &VideoRecord) -> Self {
        Self {
            identity_key: record.identity_key().map(str::to_string),
            url: record.url.clone(),
            engagement_rate: round_rate(record.engagement_rate()),
            views: record.views,
            likes: record.likes,
            comments: record.comments,
            shares: record.shares,
        }
    }
}

/// Summarize engagement for a record collection.
pub fn summarize_engagement(records: &[VideoRecord]) -> EngagementSummary {
    if records.is_empty() {
        return EngagementSummary::default();
    }

    let rates: Vec<f64> = records.iter().map(VideoRecord::engagement_rate).collect();

    let overall = OverallEngagement {
        videos: records.len(),
        avg_engagement_rate: round_rate(mean(&rates)),
        avg_views: round_pct(mean(
            &records
                .iter()
                .map(|r| r.views_or_zero() as f64)
                .collect::<Vec<_>>(),
        )),
        share_to_view: round_to(
            mean(
                &records
                    .iter()
                    .map(|r| per_view(r.shares, r.views))
                    .collect::<Vec<_>>(),
            ),
            6,
        ),
        comment_to_view: round_to(
            mean(
                &records
                    .iter()
                    .map(|r| per_view(r.comments, r.views))
                    .collect::<Vec<_>>(),
            ),
            6,
        ),
    };

    let mut tag_rates: OrderedGroups<String, Vec<f64>> = OrderedGroups::new();
    for (record, rate) in records.iter().zip(&rates) {
        for tag in record.canonical_hashtags() {
            tag_rates.entry(tag).push(*rate);
        }
    }

    let mut by_hashtag: Vec<HashtagEngagement> = tag_rates
        .iter()
        .map(|(tag, rates)| HashtagEngagement {
            hashtag: tag.clone(),
            avg_engagement_rate: round_rate(mean(rates)),
            video_count: rates.len(),
        })
        .collect();
    by_hashtag.sort_by(|a, b| {
        desc(a.avg_engagement_rate, b.avg_engagement_rate)
            .then_with(|| b.video_count.cmp(&a.video_count))
    });
    by_hashtag.truncate(TOP_HASHTAGS);

    let mut ranked: Vec<(usize, f64)> = rates.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| desc(a.1, b.1));
    let top_videos = ranked
        .into_iter()
        .take(TOP_VIDEOS)
        .map(|(idx, _)| TopVideo::from_record(&records[idx]))
        .collect();

    tracing::debug!(
        videos = overall.videos,
        hashtags = by_hashtag.len(),
        "Summarized engagement"
    );

    EngagementSummary {
        overall,
        by_hashtag,
        top_videos,
    }
}

/// `count / max(1, views)`, unknown count treated as 0.
fn per_view(count: Option<u64>, views: Option<u64>) -> f64 {
    count.unwrap_or(0) as f64 / views.unwrap_or(0).max(1) as f64
}
