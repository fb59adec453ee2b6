//! Listview Core - In-memory query engine for record list views.
//!
//! This crate turns an immutable snapshot of JSON records into a filtered,
//! sorted, optionally grouped and aggregated view. It performs no I/O; the
//! caller fetches records and owns all UI state.
//!
//! # Main Components
//!
//! - **Query**: Parses the search box DSL (`agent:john acme`)
//! - **Columns**: Per-entity column tables driving every stage
//! - **Filter / Sort / Group / Aggregate**: The pipeline stages
//! - **Pipeline**: Composes the stages, with a memoizing wrapper
//!
//! # Example
//!
//! ```rust
//! use listview_core::{run, ColumnDef, ColumnTable, SortSpec, ValueSource, ViewRequest};
//! use chrono::NaiveDate;
//! use serde_json::json;
//!
//! let table = ColumnTable::new("accounts")
//!     .column(ColumnDef::text("code", ValueSource::field("code")))
//!     .column(ColumnDef::text("agent", ValueSource::field("agent")));
//!
//! let records = vec![
//!     json!({"code": "B", "agent": "John"}),
//!     json!({"code": "A", "agent": "John"}),
//!     json!({"code": "C", "agent": "Ann"}),
//! ];
//!
//! let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
//! let request = ViewRequest::new(today)
//!     .filter("agent", "john")
//!     .sort(SortSpec::asc("code"));
//!
//! let view = run(&records, &table, &request);
//! assert_eq!(view.rows, vec![1, 0]);
//! assert_eq!(view.aggregates.count, 2);
//! ```

pub mod aggregate;
pub mod columns;
pub mod dates;
pub mod error;
pub mod filter;
pub mod group;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod sort;

// Re-export main types for convenience
pub use aggregate::{aggregate, AggregateSpec, Aggregates, CategorySpec, SumSource, SumSpec};
pub use columns::{
    ActiveRule, Band, ColumnDef, ColumnKind, ColumnTable, GroupStrategy, MatchMode, MatchTarget,
    Matcher, SearchField,
};
pub use dates::{strip_ordinal, DateBucket, DatePreset, DateRange, PresetRange};
pub use error::{ListViewError, ListViewResult};
pub use filter::{filter_rows, FilterSet, Predicate};
pub use group::{visible_items, ExpansionState, GroupBuilder, GroupNode, VisibleItem};
pub use pipeline::{run, Snapshot, ViewMemo, ViewOutput, ViewRequest};
pub use query::SearchQuery;
pub use record::ValueSource;
pub use sort::{sort_rows, SortDirection, SortSpec};
