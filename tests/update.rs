use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use cpi_tracker::handlers::update::{run_update, DocumentSource, UpdateConfig, DEFAULT_INDICATOR};
use cpi_tracker::handlers::UpdateError;
use cpi_tracker::models::TimeSeriesRecord;
use cpi_tracker::services::merger::MergeError;

fn cpi_page(last: &str, previous: &str, reference: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body>
        <table class="table table-hover">
          <thead><tr><th></th><th>Last</th><th>Previous</th><th>Highest</th><th>Lowest</th><th>Unit</th><th>Reference</th></tr></thead>
          <tbody>
            <tr><td><a href="/pakistan/inflation-cpi">Inflation Rate</a></td><td>3.00</td><td>4.10</td><td>38.00</td><td>-1.00</td><td>percent</td><td>{reference}</td></tr>
            <tr><td><a href="/pakistan/consumer-price-index-cpi">Consumer Price Index CPI</a></td><td>{last}</td><td>{previous}</td><td>{last}</td><td>0.50</td><td>points</td><td>{reference}</td></tr>
          </tbody>
        </table></body></html>"#
    )
}

struct Fixture {
    _dir: tempfile::TempDir,
    json: PathBuf,
    html: PathBuf,
}

fn fixture(json: &str, html: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("pk-cpi.json");
    let html_path = dir.path().join("page.html");
    fs::write(&json_path, json).unwrap();
    fs::write(&html_path, html).unwrap();
    Fixture { _dir: dir, json: json_path, html: html_path }
}

fn config(f: &Fixture, dry_run: bool) -> UpdateConfig {
    UpdateConfig {
        file: f.json.clone(),
        source: DocumentSource::File(f.html.clone()),
        indicator: DEFAULT_INDICATOR.to_string(),
        dry_run,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 20).unwrap()
}

fn read_record(path: &Path) -> TimeSeriesRecord {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// 2023-07 .. 2024-05 as 200.0 .. 210.0, plus any extra entries given.
fn history_json(extra_months: &str) -> String {
    let mut months: Vec<String> = (7..=12)
        .map(|m| (2023, m))
        .chain((1..=5).map(|m| (2024, m)))
        .enumerate()
        .map(|(i, (y, m))| format!("\"{}-{:02}\": {}", y, m, 200.0 + i as f64))
        .collect();
    if !extra_months.is_empty() {
        months.push(extra_months.to_string());
    }
    format!(
        r#"{{"monthly": {{ {} }}, "yearly": {{ "2023": 180.1234 }}, "metadata": {{ "lastUpdated": "2024-06-10", "source": "tradingeconomics" }}}}"#,
        months.join(", ")
    )
}

#[tokio::test]
async fn test_update_completes_fiscal_year() {
    // June arrives as "previous", July as "last"
    let f = fixture(&history_json(""), &cpi_page("212.00", "211.00", "Jul 2024"));

    let summary = run_update(&config(&f, false), today()).await.unwrap();
    assert!(summary.saved);

    let record = read_record(&f.json);
    assert_eq!(record.monthly["2024-06"], 211.0);
    assert_eq!(record.monthly["2024-07"], 212.0);
    // mean of 200..=211
    assert_eq!(record.yearly["2024"], 205.5);
    assert_eq!(record.yearly["2023"], 180.1234);
    assert_eq!(record.metadata.last_updated.as_deref(), Some("2024-08-20"));
    assert_eq!(record.metadata.extra["source"], "tradingeconomics");
}

#[tokio::test]
async fn test_reload_keeps_existing_keys() {
    let f = fixture(&history_json(""), &cpi_page("212.00", "211.00", "Jul 2024"));
    let before = read_record(&f.json);

    run_update(&config(&f, false), today()).await.unwrap();
    let after = read_record(&f.json);

    for (month, value) in &before.monthly {
        assert_eq!(after.monthly.get(month), Some(value), "{month} changed");
    }
    let added: Vec<_> = after.monthly.keys().filter(|k| !before.monthly.contains_key(*k)).collect();
    assert_eq!(added, ["2024-06", "2024-07"]);
}

#[tokio::test]
async fn test_conflict_leaves_file_untouched() {
    let f = fixture(&history_json(r#""2024-06": 120.50"#), &cpi_page("122.00", "121.00", "Jul 2024"));
    let original = fs::read_to_string(&f.json).unwrap();

    let err = run_update(&config(&f, false), today()).await.unwrap_err();
    assert!(matches!(err, UpdateError::Merge(MergeError::Consistency { .. })));
    assert_eq!(fs::read_to_string(&f.json).unwrap(), original);
}

#[tokio::test]
async fn test_implausible_drop_leaves_file_untouched() {
    let f = fixture(&history_json(""), &cpi_page("10.0", "130.0", "Jul 2024"));
    let original = fs::read_to_string(&f.json).unwrap();

    let err = run_update(&config(&f, false), today()).await.unwrap_err();
    assert!(matches!(err, UpdateError::Merge(MergeError::Plausibility(_))));
    assert_eq!(fs::read_to_string(&f.json).unwrap(), original);
}

#[tokio::test]
async fn test_dry_run_does_not_write() {
    let f = fixture(&history_json(""), &cpi_page("212.00", "211.00", "Jul 2024"));
    let original = fs::read_to_string(&f.json).unwrap();

    let summary = run_update(&config(&f, true), today()).await.unwrap();
    assert!(!summary.saved);
    assert_eq!(summary.outcome.record.yearly["2024"], 205.5);
    assert_eq!(fs::read_to_string(&f.json).unwrap(), original);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let f = fixture(&history_json(""), &cpi_page("212.00", "211.00", "Jul 2024"));

    run_update(&config(&f, false), today()).await.unwrap();
    let first = read_record(&f.json);
    run_update(&config(&f, false), today()).await.unwrap();
    let second = read_record(&f.json);

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_json_file() {
    let f = fixture("{}", &cpi_page("212.00", "211.00", "Jul 2024"));
    let mut cfg = config(&f, false);
    cfg.file = f.json.with_file_name("missing.json");

    let err = run_update(&cfg, today()).await.unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");
}

#[tokio::test]
async fn test_page_without_indicator_row() {
    let f = fixture(&history_json(""), &cpi_page("212.00", "211.00", "Jul 2024"));
    let mut cfg = config(&f, false);
    cfg.indicator = "Producer Prices".to_string();

    let err = run_update(&cfg, today()).await.unwrap_err();
    assert!(matches!(err, UpdateError::Extraction(_)));
}
