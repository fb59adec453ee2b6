//! Configuration handling
//!
//! Manages the `listview.toml` configuration file. Tables defined in the file
//! are merged over the built-in tables, replacing any with the same name.
//!
//! ## Environment Variables
//!
//! The following environment variables override config file settings:
//!
//! - `LISTVIEW_LOG_FILTER` - Default tracing filter directive
//! - `LISTVIEW_DEFAULT_TABLE` - Table used when none is named
//! - `LISTVIEW_TODAY` - Fixed reference day (`YYYY-MM-DD`) for date buckets
//!
//! These can be set in a `.env` file next to the configuration file.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use listview_core::dates::today_local;
use listview_core::{ColumnTable, ViewMemo, ViewRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::presets;
use crate::telemetry::DEFAULT_LOG_FILTER;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "listview.toml";

/// Environment variable names
pub const ENV_LOG_FILTER: &str = "LISTVIEW_LOG_FILTER";
pub const ENV_DEFAULT_TABLE: &str = "LISTVIEW_DEFAULT_TABLE";
pub const ENV_TODAY: &str = "LISTVIEW_TODAY";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Table used when a caller names none
    #[serde(default = "default_table_name")]
    pub default_table: String,
    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Fixed reference day; the local date when unset
    #[serde(default)]
    pub today: Option<NaiveDate>,
    /// Column tables by name
    #[serde(default)]
    pub tables: BTreeMap<String, ColumnTable>,
}

fn default_table_name() -> String {
    "accounts".to_string()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_table: default_table_name(),
            log_filter: default_log_filter(),
            today: None,
            tables: presets::builtin(),
        }
    }
}

impl Config {
    /// Load configuration from a directory
    ///
    /// This also loads any `.env` file in the directory and applies
    /// environment variable overrides. A missing config file yields the
    /// built-in tables only.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let env_path = dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)?
        } else {
            debug!(path = %config_path.display(), "No config file, using built-in tables");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document, merge its tables over the built-in ones and
    /// validate the result.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let parsed: Config = toml::from_str(content)?;
        let mut config = Config {
            tables: presets::builtin(),
            ..parsed.clone()
        };

        for (key, mut table) in parsed.tables {
            if table.name.is_empty() {
                table.name = key.clone();
            } else if table.name != key {
                return Err(ConfigError::NameMismatch {
                    key,
                    name: table.name,
                });
            }
            config.tables.insert(key, table);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = var(ENV_LOG_FILTER) {
            if !filter.is_empty() {
                self.log_filter = filter;
            }
        }

        if let Some(table) = var(ENV_DEFAULT_TABLE) {
            if !table.is_empty() {
                self.default_table = table;
            }
        }

        if let Some(today) = var(ENV_TODAY) {
            match NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d") {
                Ok(date) => self.today = Some(date),
                Err(_) => warn!(value = %today, "Ignoring invalid {}", ENV_TODAY),
            }
        }
    }

    /// Check every table and the default table reference.
    pub fn validate(&self) -> ConfigResult<()> {
        for (key, table) in &self.tables {
            table.validate().map_err(|source| ConfigError::InvalidTable {
                table: key.clone(),
                source,
            })?;
        }
        if !self.tables.contains_key(&self.default_table) {
            return Err(ConfigError::TableNotFound(self.default_table.clone()));
        }
        Ok(())
    }

    /// Get a table by name
    pub fn table(&self, name: &str) -> ConfigResult<&ColumnTable> {
        self.tables
            .get(name)
            .ok_or_else(|| ConfigError::TableNotFound(name.to_string()))
    }

    /// Get the default table
    pub fn default_table(&self) -> ConfigResult<&ColumnTable> {
        self.table(&self.default_table)
    }

    /// Reference day for date buckets
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(today_local)
    }

    /// Empty view request anchored on the configured day
    pub fn request(&self) -> ViewRequest {
        ViewRequest::new(self.today())
    }

    /// Memoized view over a named table
    pub fn memo(&self, name: &str) -> ConfigResult<ViewMemo> {
        let table = self.table(name)?;
        Ok(ViewMemo::new(Arc::new(table.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_table, "accounts");
        assert!(config.validate().is_ok());
        assert!(config.table("orders").is_ok());
        assert!(matches!(
            config.table("products"),
            Err(ConfigError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_from_toml_adds_table() {
        let config = Config::from_toml_str(
            r#"
default_table = "contracts"
today = "2025-01-15"

[tables.contracts]
date_column = "start"

[[tables.contracts.columns]]
name = "number"
source = { kind = "field", path = "contractNo" }

[[tables.contracts.columns]]
name = "start"
kind = "date"
source = { kind = "field", path = "startDate" }
group = { kind = "date_bucket" }
"#,
        )
        .unwrap();

        assert_eq!(config.tables.len(), 4);
        let contracts = config.default_table().unwrap();
        assert_eq!(contracts.name, "contracts");
        assert_eq!(contracts.columns.len(), 2);
        assert_eq!(config.today(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn test_invalid_table_is_rejected() {
        let err = Config::from_toml_str(
            r#"
[tables.broken]
date_column = "missing"

[[tables.broken.columns]]
name = "code"
source = { kind = "field", path = "code" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTable { .. }));
    }

    #[test]
    fn test_name_mismatch() {
        let err = Config::from_toml_str(
            r#"
[tables.a]
name = "b"

[[tables.a.columns]]
name = "code"
source = { kind = "field", path = "code" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NameMismatch { .. }));
    }

    #[test]
    fn test_unknown_default_table() {
        let err = Config::from_toml_str("default_table = \"nope\"").unwrap_err();
        assert!(matches!(err, ConfigError::TableNotFound(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_LOG_FILTER, "listview=debug"),
            (ENV_DEFAULT_TABLE, "orders"),
            (ENV_TODAY, "2025-01-15"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.log_filter, "listview=debug");
        assert_eq!(config.default_table, "orders");
        assert_eq!(config.today, NaiveDate::from_ymd_opt(2025, 1, 15));

        let mut config = Config::default();
        config.apply_overrides(|name| (name == ENV_TODAY).then(|| "15/01/2025".to_string()));
        assert_eq!(config.today, None);
    }

    #[test]
    fn test_memo_for_table() {
        let config = Config::default();
        let memo = config.memo("invoices").unwrap();
        assert_eq!(memo.table().name, "invoices");
        assert_eq!(memo.computations(), 0);
    }
}
