use listview_core::ListViewError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid table '{table}': {source}")]
    InvalidTable {
        table: String,
        #[source]
        source: ListViewError,
    },

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table key '{key}' does not match table name '{name}'")]
    NameMismatch { key: String, name: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
