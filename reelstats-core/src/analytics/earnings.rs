//! Earnings Estimator
//!
//! Rough revenue ranges for the collection under four monetization models.
//! Every model is evaluated three times, once per column of its
//! [`Assumption`] triples, giving a `low`/`mid`/`high` range:
//!
//! ```text
//! brand deals   = views × brand_cpm_per_view
//! creator fund  = views / 1000 × creator_fund_rpm
//! affiliate     = views × affiliate_click_rate × affiliate_conv% × affiliate_aov × affiliate_comm
//! merch         = interactions × merch_conv% × merch_aov × merch_margin
//! ```
//!
//! `views` and `interactions` (likes + comments + shares) are summed over
//! the whole collection, unknown counts contributing 0. Conversion rates
//! are given in percent. Amounts are rounded to cents.

use serde::{Deserialize, Serialize};

use crate::format::round_money;
use crate::types::VideoRecord;

/// One `low`/`mid`/`high` assumption, written as `[low, mid, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Assumption {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl Assumption {
    pub const fn new(low: f64, mid: f64, high: f64) -> Self {
        Self { low, mid, high }
    }

    fn columns(&self) -> [f64; 3] {
        [self.low, self.mid, self.high]
    }
}

impl From<[f64; 3]> for Assumption {
    fn from([low, mid, high]: [f64; 3]) -> Self {
        Self { low, mid, high }
    }
}

impl From<Assumption> for [f64; 3] {
    fn from(assumption: Assumption) -> Self {
        assumption.columns()
    }
}

/// Model parameters, loaded from the `[earnings]` config table.
///
/// Keys missing from the table keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsAssumptions {
    /// Dollars per view earned through brand deals
    pub brand_cpm_per_view: Assumption,
    /// Dollars per 1000 views from the creator fund
    pub creator_fund_rpm: Assumption,
    /// Fraction of viewers clicking an affiliate link
    pub affiliate_click_rate: Assumption,
    /// Percent of clicks converting to a sale
    pub affiliate_conv: Assumption,
    /// Affiliate basket size in dollars
    pub affiliate_aov: Assumption,
    /// Affiliate commission as a fraction of the basket
    pub affiliate_comm: Assumption,
    /// Percent of engaged viewers buying merch
    pub merch_conv: Assumption,
    /// Merch basket size in dollars
    pub merch_aov: Assumption,
    /// Gross margin on merch as a fraction
    pub merch_margin: Assumption,
}

impl Default for EarningsAssumptions {
    fn default() -> Self {
        Self {
            brand_cpm_per_view: Assumption::new(0.02, 0.04, 0.08),
            creator_fund_rpm: Assumption::new(0.02, 0.04, 0.06),
            affiliate_click_rate: Assumption::new(0.01, 0.02, 0.03),
            affiliate_conv: Assumption::new(0.3, 0.6, 1.2),
            affiliate_aov: Assumption::new(20.0, 40.0, 80.0),
            affiliate_comm: Assumption::new(0.08, 0.10, 0.15),
            merch_conv: Assumption::new(0.6, 1.2, 2.0),
            merch_aov: Assumption::new(25.0, 45.0, 70.0),
            merch_margin: Assumption::new(0.25, 0.40, 0.55),
        }
    }
}

impl EarningsAssumptions {
    fn named(&self) -> [(&'static str, &Assumption); 9] {
        [
            ("brand_cpm_per_view", &self.brand_cpm_per_view),
            ("creator_fund_rpm", &self.creator_fund_rpm),
            ("affiliate_click_rate", &self.affiliate_click_rate),
            ("affiliate_conv", &self.affiliate_conv),
            ("affiliate_aov", &self.affiliate_aov),
            ("affiliate_comm", &self.affiliate_comm),
            ("merch_conv", &self.merch_conv),
            ("merch_aov", &self.merch_aov),
            ("merch_margin", &self.merch_margin),
        ]
    }

    /// Name of the first assumption holding a negative or non-finite value.
    pub fn invalid_key(&self) -> Option<&'static str> {
        self.named()
            .into_iter()
            .find(|(_, a)| a.columns().iter().any(|v| !v.is_finite() || *v < 0.0))
            .map(|(name, _)| name)
    }
}

/// Parameters for [`estimate_earnings`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EarningsOptions {
    /// Label echoed in the report
    pub username: Option<String>,
    pub assumptions: EarningsAssumptions,
}

/// A dollar range, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoneyRange {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl MoneyRange {
    fn from_columns(columns: [f64; 3]) -> Self {
        let [low, mid, high] = columns.map(round_money);
        Self { low, mid, high }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsModels {
    pub brand_deals: MoneyRange,
    pub creator_fund: MoneyRange,
    pub affiliate: MoneyRange,
    pub merch: MoneyRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsEstimate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Echo of the parameters the models were evaluated with
    pub assumptions: EarningsAssumptions,
    pub models: EarningsModels,
    pub total_views: u64,
    /// Likes, comments and shares across the collection
    pub total_interactions: u64,
    pub total_videos_analyzed: usize,
}

/// Estimate earnings ranges for the collection.
pub fn estimate_earnings(records: &[VideoRecord], options: &EarningsOptions) -> EarningsEstimate {
    let total_views = records
        .iter()
        .map(VideoRecord::views_or_zero)
        .fold(0u64, u64::saturating_add);
    let total_interactions = records
        .iter()
        .map(VideoRecord::interactions)
        .fold(0u64, u64::saturating_add);

    let a = &options.assumptions;
    let views = total_views as f64;
    let engaged = total_interactions as f64;

    let models = EarningsModels {
        brand_deals: per_column(|i| views * a.brand_cpm_per_view.columns()[i]),
        creator_fund: per_column(|i| views / 1000.0 * a.creator_fund_rpm.columns()[i]),
        affiliate: per_column(|i| {
            views
                * a.affiliate_click_rate.columns()[i]
                * (a.affiliate_conv.columns()[i] / 100.0)
                * a.affiliate_aov.columns()[i]
                * a.affiliate_comm.columns()[i]
        }),
        merch: per_column(|i| {
            engaged
                * (a.merch_conv.columns()[i] / 100.0)
                * a.merch_aov.columns()[i]
                * a.merch_margin.columns()[i]
        }),
    };

    tracing::debug!(
        records = records.len(),
        total_views,
        total_interactions,
        brand_mid = models.brand_deals.mid,
        "Estimated earnings"
    );

    EarningsEstimate {
        username: options.username.clone(),
        assumptions: a.clone(),
        models,
        total_views,
        total_interactions,
        total_videos_analyzed: records.len(),
    }
}

fn per_column(model: impl Fn(usize) -> f64) -> MoneyRange {
    MoneyRange::from_columns([model(0), model(1), model(2)])
}
