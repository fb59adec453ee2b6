pub mod config;
pub mod error;
pub mod presets;
pub mod telemetry;

pub use config::Config;
pub use error::{ConfigError, ConfigResult};
pub use telemetry::init_logging;

pub use listview_core;
pub use listview_core::{
    run, Aggregates, ColumnTable, ExpansionState, GroupNode, ListViewError, SortSpec, ViewMemo,
    ViewOutput, ViewRequest,
};
