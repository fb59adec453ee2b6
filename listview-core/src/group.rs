//! Hierarchical grouping.
//!
//! `build` partitions an ordered row set by the first grouping column,
//! orders the distinct group values lexicographically by their sort key and
//! recurses into each partition with the remaining columns. Rows inside a
//! group keep their incoming (sorter) order.
//!
//! Group keys are composite paths built from each level's sort key,
//! `status:PAID>agent:John Smith` or `dateRange:01_Today`, unique across the
//! whole tree. The label shown for a level is `display_key`. Expansion state is owned by the caller
//! ([`ExpansionState`]) and only consulted when flattening for display.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::columns::{ColumnDef, ColumnTable, GroupStrategy};
use crate::dates::{format_exact, parse_date, DateBucket};
use crate::record::{is_blank, value_to_text};

/// Separator between levels of a composite group key.
pub const KEY_SEPARATOR: char = '>';

/// One group at one level of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    /// Composite path, unique in the tree.
    pub key: String,
    /// Label shown for this level.
    pub display_key: String,
    /// Grouping column of this level.
    pub column: String,
    /// Row ids under this node, in sorter order.
    pub rows: Vec<usize>,
    /// Nested groups, or None for a leaf.
    pub children: Option<Vec<GroupNode>>,
}

impl GroupNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Number of records under this node.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Depth-first leaf nodes under this node (itself when a leaf).
    pub fn leaves(&self) -> Vec<&GroupNode> {
        match &self.children {
            None => vec![self],
            Some(children) => children.iter().flat_map(|c| c.leaves()).collect(),
        }
    }

    /// Find a node by composite key in this subtree.
    pub fn find(&self, key: &str) -> Option<&GroupNode> {
        if self.key == key {
            return Some(self);
        }
        self.children
            .as_ref()?
            .iter()
            .find_map(|child| child.find(key))
    }
}

/// A record's group value: what it sorts by and what it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupValue {
    pub sort_key: String,
    pub display: String,
}

impl GroupValue {
    fn same(label: String) -> Self {
        Self {
            sort_key: label.clone(),
            display: label,
        }
    }
}

/// Compute a record's group value for one column.
pub fn group_value(column: &ColumnDef, record: &Value, today: NaiveDate) -> GroupValue {
    let value = column.source.resolve(record);

    match &column.group {
        GroupStrategy::Value => {
            if is_blank(&value) {
                GroupValue::same(column.empty_label().to_string())
            } else {
                GroupValue::same(value_to_text(&value))
            }
        }
        GroupStrategy::UpperValue => {
            if is_blank(&value) {
                GroupValue::same(column.empty_label().to_string())
            } else {
                GroupValue::same(value_to_text(&value).replace('_', " ").to_uppercase())
            }
        }
        GroupStrategy::DateBucket => match parse_date(&value) {
            Some(date) => {
                let bucket = DateBucket::classify(today, date);
                GroupValue {
                    sort_key: bucket.sort_label(),
                    display: bucket.to_string(),
                }
            }
            None => GroupValue::same(column.empty_label().to_string()),
        },
        GroupStrategy::ExactDate => match parse_date(&value) {
            Some(date) => GroupValue {
                sort_key: date.format("%Y-%m-%d").to_string(),
                display: format_exact(date),
            },
            None => GroupValue::same(column.empty_label().to_string()),
        },
        GroupStrategy::Bands { bands, otherwise } => {
            GroupValue::same(GroupStrategy::band_label(bands, otherwise, &value))
        }
        GroupStrategy::Mapping { map, otherwise } => {
            let text = value_to_text(&value);
            GroupValue::same(map.get(&text).cloned().unwrap_or_else(|| otherwise.clone()))
        }
    }
}

/// Builds group trees for one table.
#[derive(Debug, Clone, Copy)]
pub struct GroupBuilder<'t> {
    table: &'t ColumnTable,
    today: NaiveDate,
}

impl<'t> GroupBuilder<'t> {
    pub fn new(table: &'t ColumnTable, today: NaiveDate) -> Self {
        Self { table, today }
    }

    /// Build the group tree for `rows` over `group_by`. Unknown columns are
    /// skipped with a warning; no usable columns yields an empty tree.
    pub fn build(&self, records: &[Value], rows: &[usize], group_by: &[String]) -> Vec<GroupNode> {
        let columns: Vec<&ColumnDef> = group_by
            .iter()
            .filter_map(|name| {
                let column = self.table.get(name);
                if column.is_none() {
                    warn!(table = %self.table.name, column = %name, "Ignoring grouping on unknown column");
                }
                column
            })
            .collect();

        self.build_level(records, rows, &columns, "")
    }

    fn build_level(
        &self,
        records: &[Value],
        rows: &[usize],
        columns: &[&ColumnDef],
        parent_key: &str,
    ) -> Vec<GroupNode> {
        let Some((column, remaining)) = columns.split_first() else {
            return Vec::new();
        };

        // sort key -> (display, rows); BTreeMap keeps sibling order lexicographic
        let mut partitions: BTreeMap<String, (String, Vec<usize>)> = BTreeMap::new();
        for &row in rows {
            let Some(record) = records.get(row) else {
                continue;
            };
            let value = group_value(column, record, self.today);
            partitions
                .entry(value.sort_key)
                .or_insert_with(|| (value.display, Vec::new()))
                .1
                .push(row);
        }

        partitions
            .into_iter()
            .map(|(sort_key, (display, group_rows))| {
                let key = if parent_key.is_empty() {
                    format!("{}:{}", column.name, sort_key)
                } else {
                    format!("{}{}{}:{}", parent_key, KEY_SEPARATOR, column.name, sort_key)
                };
                let children = if remaining.is_empty() {
                    None
                } else {
                    Some(self.build_level(records, &group_rows, remaining, &key))
                };
                GroupNode {
                    key,
                    display_key: display,
                    column: column.name.clone(),
                    rows: group_rows,
                    children,
                }
            })
            .collect()
    }
}

/// Caller-owned set of expanded group keys, tied to the group spec it was
/// built for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    group_by: Vec<String>,
    expanded: HashSet<String>,
}

impl ExpansionState {
    pub fn new(group_by: &[String]) -> Self {
        Self {
            group_by: group_by.to_vec(),
            expanded: HashSet::new(),
        }
    }

    /// Adopt a (possibly new) group spec. A changed spec clears every
    /// expanded key; returns whether that happened.
    pub fn sync(&mut self, group_by: &[String]) -> bool {
        if self.group_by == group_by {
            return false;
        }
        self.group_by = group_by.to_vec();
        self.expanded.clear();
        true
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    pub fn expand(&mut self, key: &str) {
        self.expanded.insert(key.to_string());
    }

    /// Collapse a group together with every group nested under it.
    pub fn collapse(&mut self, key: &str) {
        let prefix = format!("{}{}", key, KEY_SEPARATOR);
        self.expanded
            .retain(|k| k != key && !k.starts_with(&prefix));
    }

    pub fn toggle(&mut self, key: &str) {
        if self.is_expanded(key) {
            self.collapse(key);
        } else {
            self.expand(key);
        }
    }

    /// Expand every group of a tree.
    pub fn expand_all(&mut self, groups: &[GroupNode]) {
        for node in groups {
            self.expand(&node.key);
            if let Some(children) = &node.children {
                self.expand_all(children);
            }
        }
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// One line of a flattened, partially expanded group tree.
#[derive(Debug, Clone, PartialEq)]
pub enum VisibleItem<'g> {
    Header {
        node: &'g GroupNode,
        depth: usize,
        expanded: bool,
    },
    Row {
        row: usize,
        depth: usize,
    },
}

/// Flatten a group tree for display. Collapsed groups show only their header.
pub fn visible_items<'g, F>(groups: &'g [GroupNode], is_expanded: F) -> Vec<VisibleItem<'g>>
where
    F: Fn(&str) -> bool,
{
    let mut items = Vec::new();
    push_visible(groups, 0, &is_expanded, &mut items);
    items
}

fn push_visible<'g, F>(groups: &'g [GroupNode], depth: usize, is_expanded: &F, items: &mut Vec<VisibleItem<'g>>)
where
    F: Fn(&str) -> bool,
{
    for node in groups {
        let expanded = is_expanded(&node.key);
        items.push(VisibleItem::Header {
            node,
            depth,
            expanded,
        });
        if !expanded {
            continue;
        }
        match &node.children {
            Some(children) => push_visible(children, depth + 1, is_expanded, items),
            None => items.extend(node.rows.iter().map(|&row| VisibleItem::Row {
                row,
                depth: depth + 1,
            })),
        }
    }
}
