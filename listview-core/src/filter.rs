//! Predicate evaluation.
//!
//! A record passes when it satisfies, all AND-combined:
//! - every active column filter
//! - the search query (field pass AND general pass)
//! - the date range, when one is set
//! - the table's active rule, when "active only" is requested

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{trace, warn};

use crate::columns::{ColumnDef, ColumnTable, MatchMode};
use crate::dates::{parse_date, DateRange};
use crate::query::SearchQuery;

/// Column name to filter value. Empty values are inactive.
pub type FilterSet = BTreeMap<String, String>;

/// A compiled predicate over one table.
#[derive(Debug)]
pub struct Predicate<'t> {
    table: &'t ColumnTable,
    column_filters: Vec<(&'t ColumnDef, String)>,
    search: SearchQuery,
    date_range: DateRange,
    active_only: bool,
}

impl<'t> Predicate<'t> {
    /// Compile filters for a table. Filters naming unknown columns are
    /// dropped with a warning; needles are lower-cased once here.
    pub fn new(table: &'t ColumnTable, filters: &FilterSet, search: SearchQuery) -> Self {
        let mut column_filters = Vec::new();
        for (name, value) in filters {
            if value.is_empty() {
                continue;
            }
            match table.get(name) {
                Some(column) => column_filters.push((column, value.to_lowercase())),
                None => warn!(table = %table.name, column = %name, "Ignoring filter on unknown column"),
            }
        }

        Self {
            table,
            column_filters,
            search,
            date_range: DateRange::default(),
            active_only: false,
        }
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    /// Evaluate the predicate for one record.
    pub fn matches(&self, record: &Value) -> bool {
        self.active_passes(record)
            && self.date_passes(record)
            && self.columns_pass(record)
            && self.fields_pass(record)
            && self.general_passes(record)
    }

    fn active_passes(&self, record: &Value) -> bool {
        if !self.active_only {
            return true;
        }
        match &self.table.active_rule {
            Some(rule) => rule.is_active(record),
            None => true,
        }
    }

    fn date_passes(&self, record: &Value) -> bool {
        if !self.date_range.is_active() {
            return true;
        }
        let Some(column) = self.table.date_column_def() else {
            return true;
        };
        match parse_date(&column.source.resolve(record)) {
            Some(date) => self.date_range.contains(date),
            None => false,
        }
    }

    fn columns_pass(&self, record: &Value) -> bool {
        self.column_filters
            .iter()
            .all(|(column, needle)| column.filter_matches(record, needle))
    }

    /// Field-qualified pass: every `field:value` must match; unknown fields fail.
    fn fields_pass(&self, record: &Value) -> bool {
        self.search.field_matches.iter().all(|(field, value)| {
            match self.table.search_field_for(field) {
                Some(search_field) => search_field
                    .target
                    .matches(record, value, MatchMode::Contains),
                None => false,
            }
        })
    }

    /// General pass: OR over (term x surface target). Vacuously true without terms.
    fn general_passes(&self, record: &Value) -> bool {
        if self.search.general_terms.is_empty() {
            return true;
        }

        self.search.general_terms.iter().any(|term| {
            if self.table.search_surface.is_empty() {
                self.table
                    .columns
                    .iter()
                    .any(|column| MatchMode::Contains.test(&column.source.resolve_text(record), term))
            } else {
                self.table
                    .search_surface
                    .iter()
                    .any(|target| target.matches(record, term, MatchMode::Contains))
            }
        })
    }
}

/// Row ids of the records passing the predicate, in snapshot order.
pub fn filter_rows(records: &[Value], predicate: &Predicate<'_>) -> Vec<usize> {
    let rows: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| predicate.matches(record))
        .map(|(row, _)| row)
        .collect();
    trace!(total = records.len(), kept = rows.len(), "Filtered records");
    rows
}

/// Narrow an existing row set further.
pub fn refine_rows(records: &[Value], rows: &[usize], predicate: &Predicate<'_>) -> Vec<usize> {
    rows.iter()
        .copied()
        .filter(|&row| records.get(row).is_some_and(|record| predicate.matches(record)))
        .collect()
}
