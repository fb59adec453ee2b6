//! Configuration Loading Tests
//!
//! Loads `listview.toml` from temporary directories and runs views over the
//! tables it defines.

use std::fs;

use chrono::NaiveDate;
use listview::config::CONFIG_FILE_NAME;
use listview::{run, Config, ConfigError, SortSpec};
use serde_json::json;
use tempfile::TempDir;

const CONTRACTS: &str = r#"
default_table = "contracts"
log_filter = "listview=debug"
today = "2025-01-15"

[tables.contracts]
date_column = "start"
active_rule = { kind = "exclude_statuses", path = "status", statuses = ["expired"] }

[tables.contracts.aggregates]
sums = [{ name = "value", source = { kind = "field", path = "value" } }]
category = { path = "status" }

[[tables.contracts.columns]]
name = "number"
source = { kind = "field", path = "contractNo" }

[[tables.contracts.columns]]
name = "customer"
source = { kind = "primary", collection = "parties", fields = ["name"] }
empty_label = "No Customer"
filter = { target = { kind = "any_element", collection = "parties", fields = ["name"] } }

[[tables.contracts.columns]]
name = "start"
kind = "date"
source = { kind = "field", path = "startDate" }
group = { kind = "date_bucket" }
empty_label = "No Date"

[[tables.contracts.search_fields]]
name = "customer"
aliases = ["party"]
target = { kind = "any_element", collection = "parties", fields = ["name"] }

[[tables.contracts.search_surface]]
kind = "values"
sources = [{ kind = "field", path = "contractNo" }]
"#;

fn write_config(content: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join(CONFIG_FILE_NAME), content).expect("Failed to write config");
    dir
}

fn contracts() -> Vec<serde_json::Value> {
    vec![
        json!({"contractNo": "C-2", "status": "active", "value": 1000, "startDate": "2025-01-15",
               "parties": [{"name": "Summit Supply"}, {"name": "ABC Farms", "isPrimary": true}]}),
        json!({"contractNo": "C-1", "status": "expired", "value": 250, "startDate": "2024-03-01",
               "parties": [{"name": "Blue Orchard"}]}),
        json!({"contractNo": "C-3", "status": "active", "value": 40}),
    ]
}

#[test]
fn test_missing_file_uses_builtin_tables() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.tables.len(), 3);
    assert!(config.table("invoices").is_ok());
}

#[test]
fn test_load_table_from_file() {
    let dir = write_config(CONTRACTS);
    let config = Config::load(dir.path()).unwrap();

    assert_eq!(config.tables.len(), 4);
    assert_eq!(config.log_filter, "listview=debug");
    assert_eq!(config.today(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());

    let table = config.default_table().unwrap();
    assert_eq!(table.name, "contracts");

    let records = contracts();
    let output = run(
        &records,
        table,
        &config.request().sort(SortSpec::asc("number")),
    );
    assert_eq!(output.rows, vec![1, 0, 2]);
    assert_eq!(output.aggregates.sum("value"), 1290.0);
    assert_eq!(output.aggregates.category_counts["active"], 2);

    let output = run(&records, table, &config.request().search("party:blue"));
    assert_eq!(output.rows, vec![1]);

    let output = run(&records, table, &config.request().active_only(true));
    assert_eq!(output.rows, vec![0, 2]);

    let output = run(&records, table, &config.request().filter("customer", "summit"));
    assert_eq!(output.rows, vec![0]);

    let output = run(&records, table, &config.request().group_by(&["customer", "start"]));
    let groups = output.groups.unwrap();
    let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["customer:ABC Farms", "customer:Blue Orchard", "customer:No Customer"]);
    let starts = groups[0].children.as_ref().unwrap();
    assert_eq!(starts[0].key, "customer:ABC Farms>start:01_Today");
}

#[test]
fn test_file_table_replaces_builtin() {
    let dir = write_config(
        r#"
[tables.orders]

[[tables.orders.columns]]
name = "orderNo"
source = { kind = "field", path = "orderNo" }
"#,
    );
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.tables.len(), 3);
    assert_eq!(config.table("orders").unwrap().columns.len(), 1);
}

#[test]
fn test_malformed_toml_fails() {
    let dir = write_config("default_table = [");
    assert!(Config::load(dir.path()).is_err());
}

#[test]
fn test_invalid_table_fails() {
    let dir = write_config(
        r#"
[tables.bad]

[[tables.bad.columns]]
name = "code"
source = { kind = "field", path = "code" }

[[tables.bad.columns]]
name = "code"
source = { kind = "field", path = "other" }
"#,
    );
    let err = Config::load(dir.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidTable { .. })
    ));
}
