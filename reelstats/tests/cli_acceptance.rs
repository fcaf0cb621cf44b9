use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("reelstats");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }

    fn write_input(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("failed to write input");
        path
    }
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../reelstats-core/tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("reelstats"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute reelstats: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "reelstats {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_json(env: &CliTestEnv, args: &[&str]) -> Value {
    let output = run_bin(env, args);
    assert_success(args, &output);
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected JSON from reelstats {:?}: {e}\n{}",
            args,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn normalize_prints_deduplicated_json_lines() {
    let env = CliTestEnv::new();
    let input = fixture("videos.jsonl");
    let args = ["normalize", "--input", input.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0]["video_id"], "7001");
    assert_eq!(lines[1]["views"], 2500);
    assert_eq!(lines[2]["create_time"], "2024-01-09T18:00:00Z");

    // Feeding the output back in is a fixed point
    let again_path = env.write_input("normalized.jsonl", &stdout);
    let again_input = again_path.to_string_lossy().into_owned();
    let again_args = ["normalize", "--input", again_input.as_str()];
    let again = run_bin(&env, &again_args);
    assert_success(&again_args, &again);
    assert_eq!(String::from_utf8_lossy(&again.stdout), stdout);
}

#[test]
fn normalize_text_reports_drop_counts() {
    let env = CliTestEnv::new();
    let input = fixture("videos.jsonl");
    let args = ["--format", "text", "normalize", "--input", input.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Records kept:      5"), "got:\n{stdout}");
    assert!(stdout.contains("Duplicates:        1"));
    assert!(stdout.contains("Malformed lines:   1"));
}

#[test]
fn hashtags_scenario_ranks_test_first() {
    let env = CliTestEnv::new();
    let input = fixture("videos.json");
    let json = run_json(
        &env,
        &["hashtags", "--input", input.as_str(), "--min-uses", "1"],
    );

    assert_eq!(json["scores"][0]["hashtag"], "test");
    assert_eq!(json["scores"][0]["liftPercentage"], 25.0);
    assert_eq!(json["hashtagCount"], 2);
    assert_eq!(json["totalVideosAnalyzed"], 3);
}

#[test]
fn posting_times_respect_timezone_flag() {
    let env = CliTestEnv::new();
    let input = fixture("videos.jsonl");

    let utc = run_json(&env, &["posting-times", "--input", input.as_str()]);
    assert_eq!(utc["timezone"], "UTC");
    assert_eq!(utc["windows"][0]["timeSlot"], "Monday 09:00");
    assert_eq!(utc["analysisPeriodDays"], 60);

    let tokyo = run_json(
        &env,
        &[
            "posting-times",
            "--input",
            input.as_str(),
            "--tz",
            "Asia/Tokyo",
            "--window-days",
            "14",
        ],
    );
    assert_eq!(tokyo["timezone"], "Asia/Tokyo");
    assert_eq!(tokyo["windows"][0]["timeSlot"], "Monday 18:00");
    assert_eq!(tokyo["analysisPeriodDays"], 14);
}

#[test]
fn config_file_supplies_defaults() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[analytics]
min_hashtag_uses = 2
"#,
    );
    let input = fixture("videos.jsonl");

    let json = run_json(&env, &["hashtags", "--input", input.as_str()]);
    let scored: Vec<_> = json["scores"]
        .as_array()
        .expect("scores array")
        .iter()
        .map(|s| s["hashtag"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(scored, vec!["fyp", "dance"]);
}

#[test]
fn sounds_and_report_produce_payloads() {
    let env = CliTestEnv::new();
    let input = fixture("videos.jsonl");

    let sounds = run_json(&env, &["sounds", "--input", input.as_str(), "--sound-id", "m2"]);
    assert_eq!(sounds["soundCount"], 1);
    assert_eq!(sounds["soundAnalysis"]["soundId"], "m2");
    assert_eq!(sounds["soundAnalysis"]["totalUses"], 2);

    let report = run_json(
        &env,
        &["report", "--input", input.as_str(), "--username", "demo"],
    );
    assert_eq!(report["username"], "demo");
    assert_eq!(report["recordsAnalyzed"], 5);
    assert_eq!(report["engagement"]["overall"]["videos"], 5);
    assert_eq!(report["sounds"]["soundCount"], 3);

    let args = ["--format", "text", "report", "--input", input.as_str()];
    let text = run_bin(&env, &args);
    assert_success(&args, &text);
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.contains("Best Posting Times"));
    assert!(stdout.contains("Monday 09:00"));
    assert!(stdout.contains("Beat One"));
}

#[test]
fn glob_input_reads_every_matching_file() {
    let env = CliTestEnv::new();
    env.write_input("a.jsonl", "{\"url\": \"u1\", \"views\": 10, \"likes\": 1}\n");
    env.write_input("b.jsonl", "{\"url\": \"u2\", \"views\": 10, \"likes\": 2}\n");
    let pattern = format!("{}/*.jsonl", env.temp_dir.path().display());

    let json = run_json(&env, &["engagement", "--input", pattern.as_str()]);
    assert_eq!(json["overall"]["videos"], 2);
    assert_eq!(json["topVideos"][0]["identityKey"], "u2");
}

#[test]
fn empty_input_is_not_an_error() {
    let env = CliTestEnv::new();
    let path = env.write_input("empty.jsonl", "");
    let input = path.to_string_lossy().into_owned();

    let json = run_json(&env, &["engagement", "--input", input.as_str()]);
    assert_eq!(json["overall"]["videos"], 0);
    assert_eq!(json["topVideos"], Value::Array(Vec::new()));
}

#[test]
fn load_and_option_errors_exit_non_zero() {
    let env = CliTestEnv::new();

    let missing = run_bin(&env, &["engagement", "--input", "/no/such/file.jsonl"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("failed to load records"));

    let pattern = format!("{}/*.nothing", env.temp_dir.path().display());
    let no_match = run_bin(&env, &["engagement", "--input", pattern.as_str()]);
    assert!(!no_match.status.success());

    let input = fixture("videos.json");
    let zero = run_bin(
        &env,
        &["hashtags", "--input", input.as_str(), "--min-uses", "0"],
    );
    assert!(!zero.status.success());
    assert!(String::from_utf8_lossy(&zero.stderr).contains("invalid options"));
}

#[test]
fn earnings_ranges_follow_config_assumptions() {
    let env = CliTestEnv::new();
    let input = fixture("videos.json");

    let defaults = run_json(&env, &["earnings", "--input", input.as_str()]);
    assert_eq!(defaults["totalViews"], 400);
    assert_eq!(defaults["totalInteractions"], 90);
    assert_eq!(defaults["models"]["brandDeals"]["mid"], 16.0);
    assert_eq!(defaults["models"]["creatorFund"]["mid"], 0.02);
    assert_eq!(defaults["models"]["merch"]["mid"], 19.44);
    assert_eq!(
        defaults["assumptions"]["merch_aov"],
        serde_json::json!([25.0, 45.0, 70.0])
    );

    env.write_config(
        r#"
[earnings]
brand_cpm_per_view = [0.1, 0.2, 0.3]
"#,
    );
    let custom = run_json(&env, &["earnings", "--input", input.as_str()]);
    assert_eq!(custom["models"]["brandDeals"]["high"], 120.0);
    assert_eq!(custom["models"]["merch"], defaults["models"]["merch"]);

    let args = ["--format", "text", "earnings", "--input", input.as_str()];
    let text = run_bin(&env, &args);
    assert_success(&args, &text);
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.contains("Earnings Estimate"), "got:\n{stdout}");
    assert!(stdout.contains("$120.00"));
}

#[test]
fn invalid_earnings_config_is_rejected() {
    let env = CliTestEnv::new();
    env.write_config("[earnings]\nmerch_conv = [-1, 1, 2]\n");
    let input = fixture("videos.json");

    let output = run_bin(&env, &["earnings", "--input", input.as_str()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("earnings.merch_conv"));
}

#[test]
fn report_accepts_threshold_and_sound_flags() {
    let env = CliTestEnv::new();
    let input = fixture("videos.jsonl");

    let report = run_json(
        &env,
        &[
            "report",
            "--input",
            input.as_str(),
            "--min-uses",
            "2",
            "--sound-id",
            "m2",
        ],
    );

    let scored: Vec<_> = report["hashtags"]["scores"]
        .as_array()
        .expect("scores array")
        .iter()
        .map(|s| s["hashtag"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(scored, vec!["fyp", "dance"]);
    assert_eq!(report["hashtags"]["topHashtags"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["sounds"]["soundId"], "m2");
    assert_eq!(report["sounds"]["soundCount"], 1);
    assert_eq!(report["sounds"]["soundAnalysis"]["soundId"], "m2");
    assert_eq!(report["earnings"]["totalViews"], 4800);
}

#[test]
fn trending_window_beyond_limit_is_a_config_error() {
    let env = CliTestEnv::new();
    env.write_config("[analytics]\ntrending_window_days = 200000000\n");
    let input = fixture("videos.jsonl");

    let output = run_bin(&env, &["sounds", "--input", input.as_str()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("trending_window_days"));
}

#[test]
fn unusable_state_dir_logs_to_stderr_and_keeps_stdout_clean() {
    let env = CliTestEnv::new();
    fs::remove_dir(&env.xdg_state).expect("failed to remove state dir");
    fs::write(&env.xdg_state, "").expect("failed to write state file");
    let input = fixture("videos.json");

    let args = ["engagement", "--input", input.as_str()];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["overall"]["videos"], 3);
    assert!(String::from_utf8_lossy(&output.stderr).contains("logging to stderr"));
}
