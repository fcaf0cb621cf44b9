//! Core domain types for reelstats
//!
//! These types represent the canonical record shape that every scraped
//! video is coerced into before analysis.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Record** | One observed video and its public metrics |
//! | **Identity key** | `video_id` if present, else `url`; unique within a normalized collection |
//! | **Engagement rate** | `(likes + comments + shares) / views`, 0 when views are 0 or unknown |
//! | **Sound** | The audio asset a video uses, keyed by id, else title |
//!
//! Counts are `Option<u64>`: `None` means the scraper could not read the
//! value, which is different from an observed zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sound key used for videos that carry no music reference at all.
pub const UNKNOWN_SOUND: &str = "Unknown Sound";

/// Audio asset referenced by a video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Music {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A normalized video record.
///
/// Serialized field names are all accepted by the normalizer, so a
/// serialized collection can be fed back through it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// Publication time, always held in UTC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    /// Tags as scraped (trimmed); see [`VideoRecord::canonical_hashtags`]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<Music>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Video length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl VideoRecord {
    /// The deduplication key: explicit video id, else URL.
    pub fn identity_key(&self) -> Option<&str> {
        non_empty(self.video_id.as_deref()).or_else(|| non_empty(self.url.as_deref()))
    }

    /// Views, treating unknown as zero.
    pub fn views_or_zero(&self) -> u64 {
        self.views.unwrap_or(0)
    }

    /// Sum of likes, comments and shares, treating unknown as zero.
    pub fn interactions(&self) -> u64 {
        self.likes
            .unwrap_or(0)
            .saturating_add(self.comments.unwrap_or(0))
            .saturating_add(self.shares.unwrap_or(0))
    }

    /// Engagement rate: `(likes + comments + shares) / views`.
    ///
    /// Returns 0.0 when views are zero or unknown.
    pub fn engagement_rate(&self) -> f64 {
        match self.views {
            Some(views) if views > 0 => self.interactions() as f64 / views as f64,
            _ => 0.0,
        }
    }

    /// Canonical tags for this record: lowercase, no leading `#`, blanks
    /// dropped, each tag at most once, in first-seen order.
    pub fn canonical_hashtags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.hashtags
            .iter()
            .filter_map(|tag| canonical_hashtag(tag))
            .filter(|tag| seen.insert(tag.clone()))
            .collect()
    }

    /// Key grouping videos by the sound they use.
    pub fn sound_key(&self) -> String {
        let music = self.music.as_ref();
        music
            .and_then(|m| non_empty(m.id.as_deref()))
            .or_else(|| music.and_then(|m| non_empty(m.title.as_deref())))
            .unwrap_or(UNKNOWN_SOUND)
            .to_string()
    }

    /// Display title of the sound, or "Unknown".
    pub fn sound_title(&self) -> &str {
        self.music
            .as_ref()
            .and_then(|m| non_empty(m.title.as_deref()))
            .unwrap_or("Unknown")
    }
}

/// Normalize a hashtag: trim, lowercase, strip one leading `#`.
///
/// Returns `None` when nothing is left.
pub fn canonical_hashtag(tag: &str) -> Option<String> {
    let lowered = tag.trim().to_lowercase();
    let tag = lowered.strip_prefix('#').unwrap_or(lowered.as_str()).trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
