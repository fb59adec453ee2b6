//! Summary statistics over the filtered set.
//!
//! Aggregates are global: they are computed from the filtered rows before
//! sorting and grouping, so neither stage can change them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{collection_elements, get_field_value, is_blank, value_to_f64, value_to_text};

/// Where a summed number comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SumSource {
    /// A numeric field of the record.
    Field { path: String },
    /// The sum of a field over every element of a sub-collection.
    Nested { collection: String, field: String },
}

impl SumSource {
    pub fn value(&self, record: &Value) -> f64 {
        match self {
            SumSource::Field { path } => value_to_f64(get_field_value(record, path)),
            SumSource::Nested { collection, field } => collection_elements(record, collection)
                .iter()
                .map(|element| value_to_f64(get_field_value(element, field)))
                .sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumSpec {
    pub name: String,
    pub source: SumSource,
}

impl SumSpec {
    pub fn field(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SumSource::Field {
                path: path.to_string(),
            },
        }
    }

    pub fn nested(name: &str, collection: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SumSource::Nested {
                collection: collection.to_string(),
                field: field.to_string(),
            },
        }
    }
}

fn default_missing_label() -> String {
    "unknown".to_string()
}

/// Categorical field counted per distinct value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub path: String,
    #[serde(default = "default_missing_label")]
    pub missing_label: String,
}

impl CategorySpec {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            missing_label: default_missing_label(),
        }
    }
}

/// Which aggregates a table reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    #[serde(default)]
    pub sums: Vec<SumSpec>,
    #[serde(default)]
    pub category: Option<CategorySpec>,
}

impl AggregateSpec {
    pub fn sum(mut self, sum: SumSpec) -> Self {
        self.sums.push(sum);
        self
    }

    pub fn category(mut self, category: CategorySpec) -> Self {
        self.category = Some(category);
        self
    }
}

/// Computed aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub count: usize,
    pub sums: BTreeMap<String, f64>,
    pub category_counts: BTreeMap<String, usize>,
}

impl Aggregates {
    /// Sum by name; unknown names read as 0.
    pub fn sum(&self, name: &str) -> f64 {
        self.sums.get(name).copied().unwrap_or(0.0)
    }
}

/// Aggregate the given rows of a snapshot.
pub fn aggregate(records: &[Value], rows: &[usize], spec: &AggregateSpec) -> Aggregates {
    let mut result = Aggregates {
        count: 0,
        sums: spec.sums.iter().map(|s| (s.name.clone(), 0.0)).collect(),
        category_counts: BTreeMap::new(),
    };

    for record in rows.iter().filter_map(|&row| records.get(row)) {
        result.count += 1;

        for sum in &spec.sums {
            if let Some(total) = result.sums.get_mut(&sum.name) {
                *total += sum.source.value(record);
            }
        }

        if let Some(category) = &spec.category {
            let value = get_field_value(record, &category.path);
            let key = if is_blank(value) {
                category.missing_label.clone()
            } else {
                value_to_text(value)
            };
            *result.category_counts.entry(key).or_insert(0) += 1;
        }
    }

    result
}
