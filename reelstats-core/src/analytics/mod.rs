//! Analytics module for reelstats
//!
//! Pure aggregations over a normalized record collection:
//! - [`engagement`]: cohort summary, per-hashtag breakdown, top videos
//! - [`posting_time`]: best day/hour windows by mean engagement
//! - [`hashtags`]: hashtag lift against the collection baseline
//! - [`sounds`]: usage timeline and trend for audio assets
//! - [`earnings`]: low/mid/high revenue ranges per monetization model
//! - [`report`]: all of the above in one pass
//!
//! Every function here is synchronous, performs no I/O and never fails.
//! Empty input produces an empty, well-formed payload. Payloads serialize
//! with camelCase keys; rates carry 4 decimal places, percentages,
//! per-video averages and money 2.

pub mod earnings;
pub mod engagement;
pub mod hashtags;
pub mod posting_time;
pub mod report;
pub mod sounds;

pub use earnings::{
    estimate_earnings, Assumption, EarningsAssumptions, EarningsEstimate, EarningsModels,
    EarningsOptions, MoneyRange,
};
pub use engagement::{
    summarize_engagement, EngagementSummary, HashtagEngagement, OverallEngagement, TopVideo,
};
pub use hashtags::{score_hashtags, HashtagOptions, HashtagReport, HashtagScore, HashtagUsage};
pub use posting_time::{
    optimize_posting_times, DayPerformance, HourPerformance, PostingTimeOptions,
    PostingTimeReport, TimeWindow,
};
pub use report::{run_report, Report, ReportOptions};
pub use sounds::{
    analyze_sound_lifespan, SoundAnalysis, SoundLifespanReport, SoundOptions, TrendingSound,
    UsageTrend,
};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

/// Groups keyed by `K`, iterated in first-insertion order.
///
/// Rankings sort these with a stable sort, so equal scores keep the order
/// in which their groups first appeared in the input.
#[derive(Debug)]
pub(crate) struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<(K, V)>,
}

impl<K: Eq + Hash + Clone, V: Default> OrderedGroups<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Mutable access to the group for `key`, creating it if needed.
    pub(crate) fn entry(&mut self, key: K) -> &mut V {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.index.insert(key.clone(), idx);
                self.groups.push((key, V::default()));
                idx
            }
        };
        &mut self.groups[idx].1
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&idx| &self.groups[idx].1)
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn first_key(&self) -> Option<&K> {
        self.groups.first().map(|(k, _)| k)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.groups.iter().map(|(k, v)| (k, v))
    }
}

/// Descending comparison for ranking by a float score.
pub(crate) fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
