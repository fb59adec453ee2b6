//! View pipeline: filter, sort, then group or pass through.
//!
//! Aggregates are taken from the filtered rows before sorting, so grouping
//! and ordering never change them. [`ViewMemo`] caches the last output and
//! recomputes only when the snapshot or a pipeline input changes.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::aggregate::{aggregate, Aggregates};
use crate::columns::ColumnTable;
use crate::dates::{today_local, DatePreset, DateRange};
use crate::error::ListViewResult;
use crate::filter::{filter_rows, FilterSet, Predicate};
use crate::group::{GroupBuilder, GroupNode};
use crate::query::SearchQuery;
use crate::sort::{sort_rows, SortSpec};

/// Shared, immutable record snapshot. Identity is the allocation.
pub type Snapshot = Arc<[Value]>;

/// Everything that shapes one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    pub column_filters: FilterSet,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: SortSpec,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub active_only: bool,
    /// Reference day for date buckets.
    #[serde(default = "today_local")]
    pub today: NaiveDate,
}

impl ViewRequest {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            column_filters: FilterSet::new(),
            search: String::new(),
            sort: SortSpec::none(),
            date_range: DateRange::default(),
            group_by: Vec::new(),
            active_only: false,
            today,
        }
    }

    /// Set a column filter; an empty value clears it.
    pub fn filter(mut self, column: &str, value: &str) -> Self {
        if value.is_empty() {
            self.column_filters.remove(column);
        } else {
            self.column_filters
                .insert(column.to_string(), value.to_string());
        }
        self
    }

    pub fn search(mut self, query: &str) -> Self {
        self.search = query.to_string();
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    /// Date range covering a preset, relative to the request's `today`.
    pub fn preset(self, preset: DatePreset) -> Self {
        let range = DateRange::from_preset(preset, self.today);
        self.date_range(range)
    }

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    /// Strict check that every referenced column exists. [`run`] itself is
    /// lenient and only warns.
    pub fn validate(&self, table: &ColumnTable) -> ListViewResult<()> {
        for column in self.column_filters.keys() {
            table.require(column)?;
        }
        if let Some(column) = &self.sort.column {
            table.require(column)?;
        }
        for column in &self.group_by {
            table.require(column)?;
        }
        Ok(())
    }
}

/// Result of one pipeline pass. Rows are positions in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewOutput {
    /// Filtered rows in sorter order.
    pub rows: Vec<usize>,
    /// Group tree when grouping is active.
    pub groups: Option<Vec<GroupNode>>,
    pub aggregates: Aggregates,
}

impl ViewOutput {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_grouped(&self) -> bool {
        self.groups.is_some()
    }

    /// The sorted records themselves.
    pub fn records<'a>(&self, records: &'a [Value]) -> Vec<&'a Value> {
        resolve_rows(records, &self.rows)
    }

    /// Look up a group anywhere in the tree.
    pub fn find_group(&self, key: &str) -> Option<&GroupNode> {
        self.groups
            .as_ref()?
            .iter()
            .find_map(|node| node.find(key))
    }
}

/// Map row ids back to records, skipping ids outside the snapshot.
pub fn resolve_rows<'a>(records: &'a [Value], rows: &[usize]) -> Vec<&'a Value> {
    rows.iter().filter_map(|&row| records.get(row)).collect()
}

/// Run the full pipeline over a snapshot.
pub fn run(records: &[Value], table: &ColumnTable, request: &ViewRequest) -> ViewOutput {
    let predicate = Predicate::new(
        table,
        &request.column_filters,
        SearchQuery::parse(&request.search),
    )
    .with_date_range(request.date_range)
    .with_active_only(request.active_only);

    let filtered = filter_rows(records, &predicate);
    let aggregates = aggregate(records, &filtered, &table.aggregates);
    let rows = sort_rows(records, &filtered, &request.sort, table);

    // grouping only on unknown columns falls back to the flat list
    let groups = if request.group_by.iter().any(|name| table.get(name).is_some()) {
        Some(GroupBuilder::new(table, request.today).build(records, &rows, &request.group_by))
    } else {
        None
    };

    debug!(
        table = %table.name,
        total = records.len(),
        rows = rows.len(),
        groups = groups.as_ref().map_or(0, |g| g.len()),
        "Computed view"
    );

    ViewOutput {
        rows,
        groups,
        aggregates,
    }
}

/// Memoized pipeline for one view over one table.
#[derive(Debug)]
pub struct ViewMemo {
    table: Arc<ColumnTable>,
    last: Option<(Snapshot, ViewRequest, Arc<ViewOutput>)>,
    computations: usize,
}

impl ViewMemo {
    pub fn new(table: Arc<ColumnTable>) -> Self {
        Self {
            table,
            last: None,
            computations: 0,
        }
    }

    pub fn table(&self) -> &ColumnTable {
        &self.table
    }

    /// Output for `request` over `snapshot`, reusing the previous result when
    /// both are unchanged. A new snapshot allocation always recomputes.
    pub fn get(&mut self, snapshot: &Snapshot, request: &ViewRequest) -> Arc<ViewOutput> {
        if let Some((last_snapshot, last_request, output)) = &self.last {
            if Arc::ptr_eq(last_snapshot, snapshot) && last_request == request {
                debug!(table = %self.table.name, "View memo hit");
                return Arc::clone(output);
            }
        }

        let output = Arc::new(run(snapshot, &self.table, request));
        self.computations += 1;
        self.last = Some((Arc::clone(snapshot), request.clone(), Arc::clone(&output)));
        output
    }

    /// Drop the cached output.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// How many times the pipeline actually ran.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
