//! reelstats - engagement analytics for scraped short-video records
//!
//! Reads record dumps (a JSON array or JSON-Lines, plain path or glob) and
//! prints one of the analyses as pretty JSON or a terminal summary.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/reelstats/config.toml (~/.config/reelstats/config.toml)
//! - Logs: $XDG_STATE_HOME/reelstats/ (~/.local/state/reelstats/)

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use reelstats_core::analytics::{
    analyze_sound_lifespan, estimate_earnings, optimize_posting_times, run_report,
    score_hashtags, summarize_engagement, EarningsEstimate, EngagementSummary, HashtagReport,
    MoneyRange, PostingTimeReport, Report, ReportOptions, SoundLifespanReport,
};
use reelstats_core::format::{format_count, format_money, format_rate_pct, format_relative_time};
use reelstats_core::ingest::{self, LoadedRecords};
use reelstats_core::Config;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reelstats")]
#[command(about = "Engagement analytics over scraped short-video records")]
#[command(version)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/reelstats/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Terminal summary
    Text,
}

#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// Record dump to read: a file path or a glob pattern
    #[arg(short, long)]
    input: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized, deduplicated records as JSON-Lines
    Normalize {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Engagement summary, per-hashtag breakdown and top videos
    Engagement {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Best posting windows, days and hours
    PostingTimes {
        #[command(flatten)]
        input: InputArgs,

        /// Label echoed in the output
        #[arg(long)]
        username: Option<String>,

        /// IANA timezone for bucketing (default: from config)
        #[arg(long)]
        tz: Option<String>,

        /// Analysis window in days, informational (default: from config)
        #[arg(long)]
        window_days: Option<u32>,
    },

    /// Hashtag lift against the collection baseline
    Hashtags {
        #[command(flatten)]
        input: InputArgs,

        /// Label echoed in the output
        #[arg(long)]
        username: Option<String>,

        /// Minimum videos per scored tag (default: from config)
        #[arg(long)]
        min_uses: Option<usize>,
    },

    /// Sound usage timeline and trending sounds
    Sounds {
        #[command(flatten)]
        input: InputArgs,

        /// Restrict the analysis to one sound id (or title)
        #[arg(long)]
        sound_id: Option<String>,

        /// Label echoed in the output
        #[arg(long)]
        username: Option<String>,
    },

    /// Low/mid/high earnings ranges (assumptions from the [earnings] config table)
    Earnings {
        #[command(flatten)]
        input: InputArgs,

        /// Label echoed in the output
        #[arg(long)]
        username: Option<String>,
    },

    /// Run every analysis over the same records
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Label echoed in the output
        #[arg(long)]
        username: Option<String>,

        /// IANA timezone for bucketing (default: from config)
        #[arg(long)]
        tz: Option<String>,

        /// Analysis window in days, informational (default: from config)
        #[arg(long)]
        window_days: Option<u32>,

        /// Minimum videos per scored tag (default: from config)
        #[arg(long)]
        min_uses: Option<usize>,

        /// Restrict the sound analysis to one sound id (or title)
        #[arg(long)]
        sound_id: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    let _log_guard = reelstats_core::logging::init(&config.logging).ok();

    let format = args.format;
    match args.command {
        Command::Normalize { input } => cmd_normalize(&input, format),
        Command::Engagement { input } => {
            let loaded = load(&input)?;
            let summary = summarize_engagement(&loaded.normalized.records);
            emit(format, &summary, || print_engagement(&summary))
        }
        Command::PostingTimes {
            input,
            username,
            tz,
            window_days,
        } => {
            apply_overrides(&mut config, tz, window_days, None)?;
            let loaded = load(&input)?;
            let options = ReportOptions {
                username,
                ..ReportOptions::from_full_config(&config)
            };
            let report = optimize_posting_times(&loaded.normalized.records, &options.posting_time());
            emit(format, &report, || print_posting_times(&report))
        }
        Command::Hashtags {
            input,
            username,
            min_uses,
        } => {
            apply_overrides(&mut config, None, None, min_uses)?;
            let loaded = load(&input)?;
            let options = ReportOptions {
                username,
                ..ReportOptions::from_full_config(&config)
            };
            let report = score_hashtags(&loaded.normalized.records, &options.hashtags());
            emit(format, &report, || print_hashtags(&report))
        }
        Command::Sounds {
            input,
            sound_id,
            username,
        } => {
            let loaded = load(&input)?;
            let options = ReportOptions {
                username,
                sound_id,
                ..ReportOptions::from_full_config(&config)
            };
            let report =
                analyze_sound_lifespan(&loaded.normalized.records, &options.sounds(), Utc::now());
            emit(format, &report, || print_sounds(&report))
        }
        Command::Earnings { input, username } => {
            let loaded = load(&input)?;
            let options = ReportOptions {
                username,
                ..ReportOptions::from_full_config(&config)
            };
            let estimate = estimate_earnings(&loaded.normalized.records, &options.earnings());
            emit(format, &estimate, || print_earnings(&estimate))
        }
        Command::Report {
            input,
            username,
            tz,
            window_days,
            min_uses,
            sound_id,
        } => {
            apply_overrides(&mut config, tz, window_days, min_uses)?;
            let loaded = load(&input)?;
            let options = ReportOptions {
                username,
                sound_id,
                ..ReportOptions::from_full_config(&config)
            };
            let report = run_report(&loaded.normalized.records, &options, Utc::now());
            emit(format, &report, || print_report(&report))
        }
    }
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(
    config: &mut Config,
    tz: Option<String>,
    window_days: Option<u32>,
    min_uses: Option<usize>,
) -> Result<()> {
    if let Some(tz) = tz {
        config.analytics.timezone = tz;
    }
    if let Some(days) = window_days {
        config.analytics.window_days = days;
    }
    if let Some(min_uses) = min_uses {
        config.analytics.min_hashtag_uses = min_uses;
    }
    config.validate().context("invalid options")?;
    Ok(())
}

fn load(input: &InputArgs) -> Result<LoadedRecords> {
    let files = ingest::resolve_inputs(&input.input)?;
    let loaded = ingest::load_records(&files)
        .with_context(|| format!("failed to load records from {}", input.input))?;

    let normalized = &loaded.normalized;
    tracing::info!(
        files = loaded.report.files_read,
        records = normalized.records.len(),
        skipped_lines = loaded.report.lines_skipped,
        duplicates = normalized.dropped_duplicates,
        without_key = normalized.dropped_without_key,
        invalid = normalized.dropped_invalid,
        "Records ready for analysis"
    );
    Ok(loaded)
}

fn emit<T: Serialize>(format: OutputFormat, payload: &T, text: impl FnOnce()) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(payload),
        OutputFormat::Text => {
            text();
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(payload: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

fn cmd_normalize(input: &InputArgs, format: OutputFormat) -> Result<()> {
    let loaded = load(input)?;
    let normalized = &loaded.normalized;

    match format {
        OutputFormat::Json => {
            for record in &normalized.records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        OutputFormat::Text => {
            print_header("Normalized Records");
            println!("   Files read:        {}", loaded.report.files_read);
            println!("   Values loaded:     {}", loaded.report.values_loaded);
            println!("   Malformed lines:   {}", loaded.report.lines_skipped);
            println!("   Records kept:      {}", normalized.records.len());
            println!("   Duplicates:        {}", normalized.dropped_duplicates);
            println!("   Without key:       {}", normalized.dropped_without_key);
            println!("   Not an object:     {}", normalized.dropped_invalid);
            println!();
        }
    }
    Ok(())
}

fn print_header(title: &str) {
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();
}

fn print_engagement(summary: &EngagementSummary) {
    print_header("Engagement");

    let overall = &summary.overall;
    if overall.videos == 0 {
        println!("  No records found.");
        println!();
        return;
    }

    println!("SUMMARY");
    println!(
        "   Videos: {:<12} Avg views: {}",
        overall.videos,
        format_count(overall.avg_views.round() as u64)
    );
    println!(
        "   Engagement: {:<8} Shares/view: {:.4}   Comments/view: {:.4}",
        format_rate_pct(overall.avg_engagement_rate),
        overall.share_to_view,
        overall.comment_to_view
    );
    println!();

    if !summary.top_videos.is_empty() {
        println!("TOP VIDEOS");
        for (i, video) in summary.top_videos.iter().enumerate() {
            println!(
                "   {:>2}. {:<8} {:>8} views  {}",
                i + 1,
                format_rate_pct(video.engagement_rate),
                format_count(video.views.unwrap_or(0)),
                video.identity_key.as_deref().unwrap_or("-")
            );
        }
        println!();
    }

    if !summary.by_hashtag.is_empty() {
        println!("BY HASHTAG");
        for tag in summary.by_hashtag.iter().take(10) {
            println!(
                "   #{:<24} {:<8} {} video{}",
                tag.hashtag,
                format_rate_pct(tag.avg_engagement_rate),
                tag.video_count,
                plural(tag.video_count)
            );
        }
        println!();
    }
}

fn print_posting_times(report: &PostingTimeReport) {
    print_header("Best Posting Times");

    println!(
        "   Videos analyzed: {:<8} Timezone: {}",
        report.total_videos_analyzed, report.timezone
    );
    println!();

    if report.windows.is_empty() && report.best_days.is_empty() && report.best_hours.is_empty() {
        println!("  Not enough timestamped videos (need 2 per slot).");
        println!();
        return;
    }

    if !report.windows.is_empty() {
        println!("WINDOWS");
        for (i, window) in report.windows.iter().enumerate() {
            println!(
                "   {:>2}. {:<16} {:<8} {} video{}",
                i + 1,
                window.time_slot,
                format_rate_pct(window.avg_engagement_rate),
                window.video_count,
                plural(window.video_count)
            );
        }
        println!();
    }

    if !report.best_days.is_empty() {
        println!("DAYS");
        for day in &report.best_days {
            println!(
                "   {:<12} {:<8} {} video{}",
                day.day,
                format_rate_pct(day.avg_engagement_rate),
                day.video_count,
                plural(day.video_count)
            );
        }
        println!();
    }

    if !report.best_hours.is_empty() {
        println!("HOURS");
        for hour in report.best_hours.iter().take(5) {
            println!(
                "   {:02}:00        {:<8} {} video{}",
                hour.hour,
                format_rate_pct(hour.avg_engagement_rate),
                hour.video_count,
                plural(hour.video_count)
            );
        }
        println!();
    }
}

fn print_hashtags(report: &HashtagReport) {
    print_header("Hashtag Efficacy");

    println!(
        "   Videos: {:<12} Tags: {:<10} Baseline: {}",
        report.total_videos_analyzed,
        report.hashtag_count,
        format_rate_pct(report.baseline_engagement)
    );
    println!();

    if report.scores.is_empty() {
        println!("  No hashtag meets the minimum usage threshold.");
        println!();
    } else {
        println!("BY LIFT");
        for score in &report.scores {
            println!(
                "   #{:<24} {:>+8.2}%  {:<8} {} video{}",
                score.hashtag,
                score.lift_percentage,
                format_rate_pct(score.avg_engagement_rate),
                score.video_count,
                plural(score.video_count)
            );
        }
        println!();
    }

    if !report.top_hashtags.is_empty() {
        println!("MOST USED");
        for usage in &report.top_hashtags {
            println!(
                "   #{:<24} {:>5} use{}  {:>8} avg views",
                usage.hashtag,
                usage.usage_count,
                plural(usage.usage_count),
                format_count(usage.avg_views_per_video.round() as u64)
            );
        }
        println!();
    }
}

fn print_sounds(report: &SoundLifespanReport) {
    print_header("Sound Lifespan");

    println!(
        "   Videos: {:<12} Sounds: {}",
        report.total_videos_analyzed, report.sound_count
    );
    println!();

    let now = Utc::now();
    match &report.sound_analysis {
        Some(analysis) => {
            println!("SOUND: {} ({})", analysis.sound_title, analysis.sound_id);
            println!(
                "   Uses: {:<14} Lifespan: {} day{}",
                analysis.total_uses,
                analysis.lifespan_days,
                plural(analysis.lifespan_days.unsigned_abs() as usize)
            );
            println!(
                "   First use: {:<9} Last use: {}",
                format_relative_time(analysis.first_use, now),
                format_relative_time(analysis.last_use, now)
            );
            if let Some(week) = &analysis.peak_week {
                println!(
                    "   Peak week: {} ({} use{})",
                    week,
                    analysis.peak_week_uses,
                    plural(analysis.peak_week_uses)
                );
            }
            println!(
                "   Engagement: {:<8} Trend: {}",
                format_rate_pct(analysis.avg_engagement_rate),
                analysis.usage_trend.as_str()
            );
            println!();
        }
        None => {
            println!("  No timestamped uses for the selected sound.");
            println!();
        }
    }

    if !report.trending_sounds.is_empty() {
        println!("TRENDING");
        for (i, sound) in report.trending_sounds.iter().enumerate() {
            println!(
                "   {:>2}. {:<28} {:>3}/{:<3} recent  score {:.2}",
                i + 1,
                sound.sound_title,
                sound.recent_uses,
                sound.total_uses,
                sound.trend_score
            );
        }
        println!();
    }
}

fn print_report(report: &Report) {
    if let Some(username) = &report.username {
        println!("Report for @{} ({} records)", username, report.records_analyzed);
    }
    print_engagement(&report.engagement);
    print_posting_times(&report.posting_times);
    print_hashtags(&report.hashtags);
    print_sounds(&report.sounds);
    print_earnings(&report.earnings);
}

fn print_earnings(estimate: &EarningsEstimate) {
    print_header("Earnings Estimate");

    println!(
        "   Videos: {:<12} Views: {:<10} Interactions: {}",
        estimate.total_videos_analyzed,
        format_count(estimate.total_views),
        format_count(estimate.total_interactions)
    );
    println!();

    println!("   {:<16} {:>14} {:>14} {:>14}", "MODEL", "LOW", "MID", "HIGH");
    let models = &estimate.models;
    print_money_row("Brand deals", &models.brand_deals);
    print_money_row("Creator fund", &models.creator_fund);
    print_money_row("Affiliate", &models.affiliate);
    print_money_row("Merch", &models.merch);
    println!();
}

fn print_money_row(label: &str, range: &MoneyRange) {
    println!(
        "   {:<16} {:>14} {:>14} {:>14}",
        label,
        format_money(range.low),
        format_money(range.mid),
        format_money(range.high)
    );
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
