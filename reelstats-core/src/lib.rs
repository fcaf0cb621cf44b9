//! # reelstats-core
//!
//! Core library for reelstats - engagement analytics over scraped
//! short-video records.
//!
//! This library provides:
//! - Domain types for video records and the sounds they use
//! - Loading and normalization of loosely-shaped scrape dumps
//! - Engagement, posting-time, hashtag and sound analyzers
//! - Earnings range estimates
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through two layers:
//! - **Canonical:** [`VideoRecord`]s produced by [`ingest::normalize`], deduplicated by identity key
//! - **Derived:** Serializable payloads computed by [`analytics`] (pure, never fail)
//!
//! ## Example
//!
//! ```rust,no_run
//! use reelstats_core::analytics::{run_report, ReportOptions};
//! use reelstats_core::{ingest, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let files = ingest::resolve_inputs("dumps/*.jsonl").expect("bad input");
//! let loaded = ingest::load_records(&files).expect("failed to load records");
//!
//! let options = ReportOptions::from_full_config(&config);
//! let report = run_report(&loaded.normalized.records, &options, chrono::Utc::now());
//! println!("{}", serde_json::to_string_pretty(&report).unwrap());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod types;
