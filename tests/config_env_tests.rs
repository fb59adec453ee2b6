//! Environment override tests
//!
//! Kept in their own test binary: `.env` loading mutates the process
//! environment.

use std::fs;

use chrono::NaiveDate;
use listview::Config;
use tempfile::TempDir;

#[test]
fn test_dotenv_overrides_file_settings() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("listview.toml"), "default_table = \"invoices\"\n")
        .expect("Failed to write config");
    fs::write(
        dir.path().join(".env"),
        "LISTVIEW_DEFAULT_TABLE=orders\nLISTVIEW_TODAY=2025-01-15\nLISTVIEW_LOG_FILTER=listview=trace\n",
    )
    .expect("Failed to write .env");

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.default_table, "orders");
    assert_eq!(config.today(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    assert_eq!(config.log_filter, "listview=trace");
    assert_eq!(config.default_table().unwrap().name, "orders");
}
