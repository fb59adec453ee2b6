//! Single-column, type-aware sorting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::columns::{ColumnKind, ColumnTable};
use crate::dates::epoch_millis;
use crate::error::{ListViewError, ListViewResult};
use crate::record::{value_to_f64, value_to_text};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ListViewError;

    fn from_str(s: &str) -> ListViewResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ListViewError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// The active sort, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn asc(column: &str) -> Self {
        Self {
            column: Some(column.to_string()),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: Some(column.to_string()),
            direction: SortDirection::Desc,
        }
    }

    pub fn is_active(&self) -> bool {
        self.column.is_some()
    }

    /// Header click: the active column cycles asc -> desc -> none, any other
    /// column starts at asc.
    pub fn toggle(&self, column: &str) -> Self {
        match (&self.column, self.direction) {
            (Some(active), SortDirection::Asc) if active == column => Self::desc(column),
            (Some(active), SortDirection::Desc) if active == column => Self::none(),
            _ => Self::asc(column),
        }
    }
}

/// Locale-style string ordering: case-folded first, exact text breaks ties.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

enum SortKey {
    Text(String),
    Number(f64),
    Date(i64),
}

impl SortKey {
    fn of(kind: ColumnKind, value: &Value) -> Self {
        match kind {
            ColumnKind::Number => SortKey::Number(value_to_f64(value)),
            ColumnKind::Date => SortKey::Date(epoch_millis(value)),
            ColumnKind::Text | ColumnKind::Boolean => SortKey::Text(value_to_text(value)),
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Return `rows` ordered by `spec`. The sort is stable, so ties keep their
/// incoming order; no active column or an unknown one returns the rows
/// unchanged.
pub fn sort_rows(records: &[Value], rows: &[usize], spec: &SortSpec, table: &ColumnTable) -> Vec<usize> {
    let Some(column_name) = &spec.column else {
        return rows.to_vec();
    };
    let Some(column) = table.get(column_name) else {
        warn!(table = %table.name, column = %column_name, "Ignoring sort on unknown column");
        return rows.to_vec();
    };

    let mut keyed: Vec<(SortKey, usize)> = rows
        .iter()
        .filter_map(|&row| records.get(row).map(|record| (row, record)))
        .map(|(row, record)| (SortKey::of(column.kind, &column.source.resolve(record)), row))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = a.compare(b);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnDef;
    use crate::record::ValueSource;
    use serde_json::json;

    fn table() -> ColumnTable {
        ColumnTable::new("t")
            .column(ColumnDef::text("code", ValueSource::field("code")))
            .column(ColumnDef::number("amount", ValueSource::field("amount")))
            .column(ColumnDef::date("date", ValueSource::field("date")))
            .column(ColumnDef::text("contact", ValueSource::primary("contacts", &["name"])))
    }

    fn codes(records: &[Value], rows: &[usize]) -> Vec<String> {
        rows.iter().map(|&r| value_to_text(&records[r]["code"])).collect()
    }

    #[test]
    fn test_sort_codes() {
        let records = vec![json!({"code": "B"}), json!({"code": "A"}), json!({"code": "C"})];
        let rows = [0, 1, 2];
        let asc = sort_rows(&records, &rows, &SortSpec::asc("code"), &table());
        assert_eq!(codes(&records, &asc), vec!["A", "B", "C"]);
        let desc = sort_rows(&records, &rows, &SortSpec::desc("code"), &table());
        assert_eq!(codes(&records, &desc), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_numeric_and_date_sort() {
        let records = vec![
            json!({"code": "a", "amount": 1000, "date": "2025-03-01"}),
            json!({"code": "b", "amount": 90, "date": "2024-12-31"}),
            json!({"code": "c", "date": "2025-01-15"}),
        ];
        let rows = [0, 1, 2];
        let by_amount = sort_rows(&records, &rows, &SortSpec::asc("amount"), &table());
        assert_eq!(codes(&records, &by_amount), vec!["c", "b", "a"]);
        let by_date = sort_rows(&records, &rows, &SortSpec::desc("date"), &table());
        assert_eq!(codes(&records, &by_date), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_relational_sort_uses_primary() {
        let records = vec![
            json!({"code": "1", "contacts": [{"name": "Zed"}, {"name": "Amy", "isPrimary": true}]}),
            json!({"code": "2", "contacts": [{"name": "Mia"}]}),
            json!({"code": "3"}),
        ];
        let sorted = sort_rows(&records, &[0, 1, 2], &SortSpec::asc("contact"), &table());
        assert_eq!(codes(&records, &sorted), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_sort_is_stable_and_pure() {
        let records = vec![
            json!({"code": "x", "amount": 5}),
            json!({"code": "y", "amount": 5}),
            json!({"code": "z", "amount": 1}),
        ];
        let rows = vec![0, 1, 2];
        let sorted = sort_rows(&records, &rows, &SortSpec::asc("amount"), &table());
        assert_eq!(codes(&records, &sorted), vec!["z", "x", "y"]);
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn test_numeric_sort_with_non_numeric_strings() {
        let records: Vec<Value> = (0..200)
            .map(|i| {
                let amount = if i % 7 == 0 { json!("NaN") } else { json!((i * 37) % 101) };
                json!({"code": i.to_string(), "amount": amount})
            })
            .collect();
        let rows: Vec<usize> = (0..records.len()).collect();

        let sorted = sort_rows(&records, &rows, &SortSpec::asc("amount"), &table());
        assert_eq!(sorted.len(), 200);
        let amounts: Vec<f64> = sorted.iter().map(|&r| value_to_f64(&records[r]["amount"])).collect();
        assert!(amounts.windows(2).all(|w| w[0] <= w[1]));

        let sorted = sort_rows(&records, &rows, &SortSpec::desc("amount"), &table());
        let amounts: Vec<f64> = sorted.iter().map(|&r| value_to_f64(&records[r]["amount"])).collect();
        assert!(amounts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_inactive_or_unknown_sort_keeps_order() {
        let records = vec![json!({"code": "B"}), json!({"code": "A"})];
        assert_eq!(sort_rows(&records, &[0, 1], &SortSpec::none(), &table()), vec![0, 1]);
        assert_eq!(sort_rows(&records, &[0, 1], &SortSpec::asc("nope"), &table()), vec![0, 1]);
    }

    #[test]
    fn test_case_folded_text_order() {
        assert_eq!(compare_text("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_text("a", "A"), Ordering::Greater);
    }

    #[test]
    fn test_toggle_cycle() {
        let spec = SortSpec::none().toggle("code");
        assert_eq!(spec, SortSpec::asc("code"));
        let spec = spec.toggle("code");
        assert_eq!(spec, SortSpec::desc("code"));
        let spec = spec.toggle("code");
        assert_eq!(spec, SortSpec::none());

        let spec = SortSpec::desc("code").toggle("name");
        assert_eq!(spec, SortSpec::asc("name"));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("up".parse::<SortDirection>().is_err());
    }
}
