//! Record normalizer
//!
//! Coerces loosely-typed scraped records into [`VideoRecord`]s and
//! deduplicates them by identity key.
//!
//! Scrapers disagree on field names (`views` vs `playCount`), on number
//! encodings (`"1.2M"`, `"12,345"`) and on timestamp formats (epoch
//! seconds, epoch millis, ISO-8601 with or without `Z`). Every accepted
//! spelling is listed in an alias table below; the first alias present
//! with a non-null value wins.
//!
//! Nothing here fails: an unparseable field becomes `None`, a value that
//! is not an object is counted and dropped.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::types::{Music, VideoRecord};

const URL_ALIASES: &[&str] = &["url", "video_url", "webVideoUrl", "share_url"];
const VIDEO_ID_ALIASES: &[&str] = &["video_id", "videoId", "id", "aweme_id"];
const CREATE_TIME_ALIASES: &[&str] = &["create_time", "createTime", "created_at", "timestamp"];
const VIEWS_ALIASES: &[&str] = &["views", "play_count", "playCount", "view_count"];
const LIKES_ALIASES: &[&str] = &["likes", "digg_count", "diggCount", "like_count"];
const COMMENTS_ALIASES: &[&str] = &["comments", "comment_count", "commentCount"];
const SHARES_ALIASES: &[&str] = &["shares", "share_count", "shareCount"];
const HASHTAGS_ALIASES: &[&str] = &["hashtags", "tags", "challenges"];
const MUSIC_ALIASES: &[&str] = &["music", "sound"];
const CAPTION_ALIASES: &[&str] = &["caption", "desc", "description", "text"];
const DURATION_ALIASES: &[&str] = &["duration", "video_duration"];

/// Nested objects consulted for counts when no top-level alias matches.
const STATS_OBJECTS: &[&str] = &["stats", "statsV2"];

/// Epoch values above this are taken to be milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Output of [`normalize`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Normalized {
    /// Canonical records in input order, one per identity key
    pub records: Vec<VideoRecord>,
    /// Records dropped because an earlier record had the same key
    pub dropped_duplicates: usize,
    /// Records dropped because they had neither video id nor url
    pub dropped_without_key: usize,
    /// Values dropped because they were not JSON objects
    pub dropped_invalid: usize,
}

/// Coerce and deduplicate a sequence of loose records.
///
/// The first record seen for each identity key is kept; later ones are
/// dropped silently (counted in the result).
pub fn normalize(values: &[Value]) -> Normalized {
    let mut out = Normalized::default();
    let mut seen: HashSet<String> = HashSet::new();

    for value in values {
        let Some(record) = coerce(value) else {
            out.dropped_invalid += 1;
            continue;
        };

        let Some(key) = record.identity_key().map(str::to_string) else {
            out.dropped_without_key += 1;
            continue;
        };

        if !seen.insert(key) {
            out.dropped_duplicates += 1;
            continue;
        }

        out.records.push(record);
    }

    tracing::debug!(
        kept = out.records.len(),
        duplicates = out.dropped_duplicates,
        without_key = out.dropped_without_key,
        invalid = out.dropped_invalid,
        "Normalized records"
    );

    out
}

/// Coerce one loose value into a record, without deduplication.
///
/// Returns `None` only when the value is not a JSON object.
pub fn coerce(value: &Value) -> Option<VideoRecord> {
    let obj = value.as_object()?;

    Some(VideoRecord {
        url: lookup(obj, URL_ALIASES).and_then(parse_string),
        video_id: lookup(obj, VIDEO_ID_ALIASES).and_then(parse_identifier),
        create_time: lookup(obj, CREATE_TIME_ALIASES).and_then(parse_timestamp),
        views: count_field(obj, VIEWS_ALIASES),
        likes: count_field(obj, LIKES_ALIASES),
        comments: count_field(obj, COMMENTS_ALIASES),
        shares: count_field(obj, SHARES_ALIASES),
        hashtags: lookup(obj, HASHTAGS_ALIASES)
            .map(parse_hashtags)
            .unwrap_or_default(),
        music: lookup(obj, MUSIC_ALIASES).and_then(parse_music),
        caption: lookup(obj, CAPTION_ALIASES).and_then(parse_string),
        duration: lookup(obj, DURATION_ALIASES).and_then(parse_seconds),
    })
}

/// First alias present with a non-null value.
fn lookup<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| obj.get(*alias))
        .find(|v| !v.is_null())
}

/// Resolve a count from top-level aliases, then from nested stats objects.
fn count_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<u64> {
    if let Some(value) = lookup(obj, aliases) {
        return parse_count(value);
    }
    STATS_OBJECTS
        .iter()
        .filter_map(|name| obj.get(*name).and_then(Value::as_object))
        .find_map(|stats| lookup(stats, aliases))
        .and_then(parse_count)
}

/// Parse a count that may be a number or a human-formatted string.
///
/// Accepts thousands separators (`12,345`) and a trailing case-insensitive
/// `k`/`m`/`b` multiplier (`1.2K` = 1200). Negative, fractional-garbage and
/// non-numeric input yields `None`.
pub fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u)
            } else {
                n.as_f64().and_then(float_to_count)
            }
        }
        Value::String(s) => parse_count_str(s),
        _ => None,
    }
}

fn parse_count_str(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect::<String>()
        .to_lowercase();

    if cleaned.is_empty() {
        return None;
    }

    let (digits, exponent) = match cleaned.chars().last() {
        Some('k') => (&cleaned[..cleaned.len() - 1], 3),
        Some('m') => (&cleaned[..cleaned.len() - 1], 6),
        Some('b') => (&cleaned[..cleaned.len() - 1], 9),
        _ => (cleaned.as_str(), 0),
    };

    scale_decimal(digits, exponent).or_else(|| {
        let number: f64 = digits.parse().ok()?;
        float_to_count(number * 10f64.powi(exponent as i32))
    })
}

/// `digits × 10^exponent` computed exactly for plain decimals like `1.25`.
///
/// Fraction digits left over after scaling are truncated.
fn scale_decimal(digits: &str, exponent: u32) -> Option<u64> {
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let kept: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(exponent as usize)
        .collect();
    let fraction: u64 = if kept.is_empty() { 0 } else { kept.parse().ok()? };

    whole
        .checked_mul(10u64.checked_pow(exponent)?)?
        .checked_add(fraction)
}

fn float_to_count(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value <= u64::MAX as f64 {
        Some(value.trunc() as u64)
    } else {
        None
    }
}

/// Parse a publication time.
///
/// Accepts epoch seconds (or milliseconds) as numbers or numeric strings,
/// RFC 3339 / ISO-8601 with `Z` or an offset, and naive ISO date-times
/// or dates, which are taken to be UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(epoch) = s.parse::<f64>() {
        return from_epoch(epoch);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = s.trim_end_matches(['Z', 'z']);
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let secs = if value.abs() > EPOCH_MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    };
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Tags from a list (strings or `{title|name}` objects) or a delimited string.
fn parse_hashtags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => lookup(obj, &["title", "name", "hashtagName"])
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_music(value: &Value) -> Option<Music> {
    let music = match value {
        Value::Object(obj) => Music {
            id: lookup(obj, &["id", "music_id", "musicId"]).and_then(parse_identifier),
            title: lookup(obj, &["title", "name"]).and_then(parse_string),
        },
        Value::String(_) => Music {
            id: None,
            title: parse_string(value),
        },
        _ => return None,
    };

    if music.id.is_none() && music.title.is_none() {
        None
    } else {
        Some(music)
    }
}

fn parse_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Ids are sometimes emitted as bare numbers.
fn parse_identifier(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        _ => parse_string(value),
    }
}

fn parse_seconds(value: &Value) -> Option<f64> {
    let secs = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_count_numbers() {
        assert_eq!(parse_count(&json!(42)), Some(42));
        assert_eq!(parse_count(&json!(42.7)), Some(42));
        assert_eq!(parse_count(&json!(0.99)), Some(0));
        assert_eq!(parse_count(&json!(-5)), None);
        assert_eq!(parse_count(&json!(true)), None);
        assert_eq!(parse_count(&json!(null)), None);
    }

    #[test]
    fn test_parse_count_truncates_fractions() {
        assert_eq!(parse_count(&json!("12.9")), Some(12));
        assert_eq!(parse_count(&json!("1.2345K")), Some(1_234));
        assert_eq!(parse_count(&json!("0.29k")), Some(290));
        assert_eq!(parse_count(&json!("4.35M")), Some(4_350_000));
        assert_eq!(parse_count(&json!("1e3")), Some(1_000));
        assert_eq!(parse_count(&json!("99999999999999999999")), None);
    }

    #[test]
    fn test_parse_count_strings() {
        assert_eq!(parse_count(&json!("12,345")), Some(12_345));
        assert_eq!(parse_count(&json!("1.2K")), Some(1_200));
        assert_eq!(parse_count(&json!("3m")), Some(3_000_000));
        assert_eq!(parse_count(&json!("2.5B")), Some(2_500_000_000));
        assert_eq!(parse_count(&json!(" 987 ")), Some(987));
        assert_eq!(parse_count(&json!("abc")), None);
        assert_eq!(parse_count(&json!("")), None);
        assert_eq!(parse_count(&json!("k")), None);
        assert_eq!(parse_count(&json!("1.")), Some(1));
        assert_eq!(parse_count(&json!("-3")), None);
    }

    #[test]
    fn test_parse_timestamp_epoch() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!(1672567200)), Some(expected));
        assert_eq!(parse_timestamp(&json!(1672567200.0)), Some(expected));
        assert_eq!(parse_timestamp(&json!("1672567200")), Some(expected));
        assert_eq!(parse_timestamp(&json!(1672567200000_i64)), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_iso() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2023-01-01T10:00:00Z")), Some(expected));
        assert_eq!(
            parse_timestamp(&json!("2023-01-01T12:00:00+02:00")),
            Some(expected)
        );
        assert_eq!(parse_timestamp(&json!("2023-01-01T10:00:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2023-01-01 10:00:00")), Some(expected));
        assert_eq!(
            parse_timestamp(&json!("2023-01-01")),
            Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!("")), None);
        assert_eq!(parse_timestamp(&json!({"t": 1})), None);
    }

    #[test]
    fn test_coerce_aliases() {
        let raw = json!({
            "webVideoUrl": "https://example.com/@me/video/1",
            "id": 7_000_000_000_u64,
            "createTime": "2023-01-01T10:00:00Z",
            "playCount": "1.5K",
            "diggCount": 120,
            "commentCount": "7",
            "shareCount": null,
            "stats": { "shareCount": 3 },
            "tags": "#fyp, dance  comedy",
            "music": { "id": 99, "title": "Original Sound" },
            "desc": "hello"
        });

        let rec = coerce(&raw).unwrap();
        assert_eq!(rec.url.as_deref(), Some("https://example.com/@me/video/1"));
        assert_eq!(rec.video_id.as_deref(), Some("7000000000"));
        assert_eq!(rec.views, Some(1_500));
        assert_eq!(rec.likes, Some(120));
        assert_eq!(rec.comments, Some(7));
        assert_eq!(rec.shares, Some(3));
        assert_eq!(rec.hashtags, vec!["#fyp", "dance", "comedy"]);
        assert_eq!(
            rec.music,
            Some(Music {
                id: Some("99".to_string()),
                title: Some("Original Sound".to_string())
            })
        );
        assert_eq!(rec.caption.as_deref(), Some("hello"));
        assert!(rec.create_time.is_some());
    }

    #[test]
    fn test_coerce_unknown_fields() {
        let rec = coerce(&json!({"url": "u", "views": "lots", "createTime": "soon"})).unwrap();
        assert_eq!(rec.views, None);
        assert_eq!(rec.create_time, None);
        assert!(coerce(&json!([1, 2])).is_none());
        assert!(coerce(&json!("text")).is_none());
    }

    #[test]
    fn test_hashtag_objects() {
        let rec = coerce(&json!({"url": "u", "challenges": [{"title": "Cats"}, {"name": "dogs"}, 5]}))
            .unwrap();
        assert_eq!(rec.hashtags, vec!["Cats", "dogs"]);
    }

    #[test]
    fn test_normalize_dedup_keeps_first() {
        let values = vec![
            json!({"url": "a", "views": 1}),
            json!({"url": "b", "views": 2}),
            json!({"url": "a", "views": 3}),
            json!({"video_id": "x", "url": "c"}),
            json!({"video_id": "x", "url": "d"}),
            json!({"views": 10}),
            json!(42),
        ];

        let out = normalize(&values);
        let keys: Vec<_> = out.records.iter().filter_map(|r| r.identity_key()).collect();
        assert_eq!(keys, vec!["a", "b", "x"]);
        assert_eq!(out.records[0].views, Some(1));
        assert_eq!(out.dropped_duplicates, 2);
        assert_eq!(out.dropped_without_key, 1);
        assert_eq!(out.dropped_invalid, 1);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let values = vec![
            json!({"url": "a", "createTime": 1672567200.25, "playCount": "2.1M", "likes": "1,024",
                   "hashtags": ["#One", "two"], "music": "Track", "duration": 15.5}),
            json!({"video_id": "v2", "create_time": "2024-03-01T08:30:00+01:00", "views": 0}),
            json!({"url": "a", "views": 5}),
        ];

        let first = normalize(&values);
        let reserialized: Vec<Value> = first
            .records
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect();
        let second = normalize(&reserialized);

        assert_eq!(first.records, second.records);
        assert_eq!(second.dropped_duplicates, 0);
    }
}
