//! Column-definition tables.
//!
//! A [`ColumnTable`] describes one entity's list view as data: for every
//! column where its value comes from, how it compares, how a column filter
//! matches it and how it groups. Search aliases, the general search surface,
//! the date-range column, the active-only rule and the aggregate spec live
//! next to the columns so one engine serves every list page.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::AggregateSpec;
use crate::error::{ListViewError, ListViewResult};
use crate::record::{
    collection_elements, contains_ci, get_field_value, value_to_f64, value_to_text, ValueSource,
};

/// Comparator kind used by the sorter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    /// Amounts, quantities, currency
    Number,
    Date,
    Boolean,
}

/// How a needle is compared against a candidate value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive substring
    #[default]
    Contains,
    /// Case-insensitive equality, for enumerated values such as a status
    Exact,
}

impl MatchMode {
    /// `needle` must already be lower-cased.
    #[inline]
    pub fn test(&self, candidate: &str, needle: &str) -> bool {
        match self {
            MatchMode::Contains => contains_ci(candidate, needle),
            MatchMode::Exact => candidate.to_lowercase() == needle,
        }
    }
}

/// What part of a record a matcher looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchTarget {
    /// Any of the resolved values.
    Values { sources: Vec<ValueSource> },
    /// Any listed field of any element of a sub-collection. With a
    /// `separator`, each element's fields are joined into one text (blank
    /// ones skipped) and matched as a whole, the way the cell shows it.
    AnyElement {
        collection: String,
        fields: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
    },
}

impl MatchTarget {
    pub fn fields(paths: &[&str]) -> Self {
        MatchTarget::Values {
            sources: paths.iter().map(|p| ValueSource::field(p)).collect(),
        }
    }

    pub fn any_element(collection: &str, fields: &[&str]) -> Self {
        MatchTarget::AnyElement {
            collection: collection.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            separator: None,
        }
    }

    /// Like [`MatchTarget::any_element`], matching each element's fields
    /// joined with `separator`.
    pub fn joined_element(collection: &str, fields: &[&str], separator: &str) -> Self {
        MatchTarget::AnyElement {
            collection: collection.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            separator: Some(separator.to_string()),
        }
    }

    /// Test a lower-cased needle against this target.
    pub fn matches(&self, record: &Value, needle: &str, mode: MatchMode) -> bool {
        match self {
            MatchTarget::Values { sources } => sources
                .iter()
                .any(|source| mode.test(&source.resolve_text(record), needle)),
            MatchTarget::AnyElement {
                collection,
                fields,
                separator: None,
            } => collection_elements(record, collection).iter().any(|element| {
                fields
                    .iter()
                    .any(|field| mode.test(&value_to_text(get_field_value(element, field)), needle))
            }),
            MatchTarget::AnyElement {
                collection,
                fields,
                separator: Some(separator),
            } => collection_elements(record, collection).iter().any(|element| {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|field| value_to_text(get_field_value(element, field)))
                    .filter(|text| !text.trim().is_empty())
                    .collect();
                mode.test(&parts.join(separator), needle)
            }),
        }
    }
}

/// A target plus the comparison applied to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matcher {
    pub target: MatchTarget,
    #[serde(default)]
    pub mode: MatchMode,
}

impl Matcher {
    pub fn contains(target: MatchTarget) -> Self {
        Self {
            target,
            mode: MatchMode::Contains,
        }
    }

    pub fn exact(target: MatchTarget) -> Self {
        Self {
            target,
            mode: MatchMode::Exact,
        }
    }

    #[inline]
    pub fn matches(&self, record: &Value, needle: &str) -> bool {
        self.target.matches(record, needle, self.mode)
    }
}

/// One numeric band of a [`GroupStrategy::Bands`] grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Values strictly below this bound fall in the band.
    pub below: f64,
    pub label: String,
}

/// How a column turns a record into a group value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupStrategy {
    /// The resolved value as text.
    #[default]
    Value,
    /// Resolved value with underscores as spaces, upper-cased.
    UpperValue,
    /// Relative date bucket (Today, Yesterday, ..., Older (year)).
    DateBucket,
    /// Calendar day, labelled like `Jan 15, 2025`.
    ExactDate,
    /// Numeric thresholds, checked in order.
    Bands { bands: Vec<Band>, otherwise: String },
    /// Value-to-category lookup.
    Mapping {
        map: BTreeMap<String, String>,
        otherwise: String,
    },
}

impl GroupStrategy {
    pub fn is_date_based(&self) -> bool {
        matches!(self, GroupStrategy::DateBucket | GroupStrategy::ExactDate)
    }

    pub(crate) fn band_label(bands: &[Band], otherwise: &str, value: &Value) -> String {
        let amount = value_to_f64(value);
        bands
            .iter()
            .find(|band| amount < band.below)
            .map(|band| band.label.clone())
            .unwrap_or_else(|| otherwise.to_string())
    }
}

/// Label used for blank group values when a column sets none.
pub const DEFAULT_EMPTY_LABEL: &str = "Unknown";

/// One column of a list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub source: ValueSource,
    #[serde(default)]
    pub kind: ColumnKind,
    /// Column filter matcher; defaults to substring on `source`.
    #[serde(default)]
    pub filter: Option<Matcher>,
    #[serde(default)]
    pub group: GroupStrategy,
    /// Group label for records without a value.
    #[serde(default)]
    pub empty_label: Option<String>,
}

impl ColumnDef {
    pub fn new(name: &str, source: ValueSource, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            source,
            kind,
            filter: None,
            group: GroupStrategy::Value,
            empty_label: None,
        }
    }

    pub fn text(name: &str, source: ValueSource) -> Self {
        Self::new(name, source, ColumnKind::Text)
    }

    pub fn number(name: &str, source: ValueSource) -> Self {
        Self::new(name, source, ColumnKind::Number)
    }

    pub fn date(name: &str, source: ValueSource) -> Self {
        Self::new(name, source, ColumnKind::Date)
    }

    pub fn with_filter(mut self, matcher: Matcher) -> Self {
        self.filter = Some(matcher);
        self
    }

    pub fn with_group(mut self, group: GroupStrategy) -> Self {
        self.group = group;
        self
    }

    pub fn with_empty_label(mut self, label: &str) -> Self {
        self.empty_label = Some(label.to_string());
        self
    }

    pub fn empty_label(&self) -> &str {
        self.empty_label.as_deref().unwrap_or(DEFAULT_EMPTY_LABEL)
    }

    /// Apply this column's filter to a record. `needle` must be lower-cased.
    pub fn filter_matches(&self, record: &Value, needle: &str) -> bool {
        match &self.filter {
            Some(matcher) => matcher.matches(record, needle),
            None => MatchMode::Contains.test(&self.source.resolve_text(record), needle),
        }
    }
}

/// A `field:` name accepted by the search box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchField {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub target: MatchTarget,
}

impl SearchField {
    pub fn new(name: &str, target: MatchTarget) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            target,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn answers_to(&self, field: &str) -> bool {
        self.name.eq_ignore_ascii_case(field)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(field))
    }
}

/// Rule behind the "active only" toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveRule {
    /// A boolean field that must be true.
    Flag { path: String },
    /// A status field that must not hold any of the listed values.
    ExcludeStatuses { path: String, statuses: Vec<String> },
}

impl ActiveRule {
    pub fn is_active(&self, record: &Value) -> bool {
        match self {
            ActiveRule::Flag { path } => get_field_value(record, path).as_bool().unwrap_or(false),
            ActiveRule::ExcludeStatuses { path, statuses } => {
                let status = value_to_text(get_field_value(record, path));
                !statuses.iter().any(|s| *s == status)
            }
        }
    }
}

/// Full configuration of one list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTable {
    /// Filled from the config key when loaded from a file.
    #[serde(default)]
    pub name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub search_fields: Vec<SearchField>,
    /// Targets an unqualified search term is tried against.
    #[serde(default)]
    pub search_surface: Vec<MatchTarget>,
    /// Column the date-range filter applies to.
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub active_rule: Option<ActiveRule>,
    #[serde(default)]
    pub aggregates: AggregateSpec,
}

impl ColumnTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            search_fields: Vec::new(),
            search_surface: Vec::new(),
            date_column: None,
            active_rule: None,
            aggregates: AggregateSpec::default(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn search_field(mut self, field: SearchField) -> Self {
        self.search_fields.push(field);
        self
    }

    pub fn surface(mut self, target: MatchTarget) -> Self {
        self.search_surface.push(target);
        self
    }

    pub fn date_column(mut self, name: &str) -> Self {
        self.date_column = Some(name.to_string());
        self
    }

    pub fn active_rule(mut self, rule: ActiveRule) -> Self {
        self.active_rule = Some(rule);
        self
    }

    pub fn aggregates(mut self, spec: AggregateSpec) -> Self {
        self.aggregates = spec;
        self
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, failing on unknown names.
    pub fn require(&self, name: &str) -> ListViewResult<&ColumnDef> {
        self.get(name)
            .ok_or_else(|| ListViewError::UnknownColumn(name.to_string()))
    }

    /// Search field answering to a (lower-cased) `field:` name.
    pub fn search_field_for(&self, field: &str) -> Option<&SearchField> {
        self.search_fields.iter().find(|f| f.answers_to(field))
    }

    pub fn date_column_def(&self) -> Option<&ColumnDef> {
        self.date_column.as_deref().and_then(|name| self.get(name))
    }

    /// Check the table is internally consistent.
    pub fn validate(&self) -> ListViewResult<()> {
        if self.name.trim().is_empty() {
            return Err(ListViewError::InvalidTable("table name is empty".to_string()));
        }
        if self.columns.is_empty() {
            return Err(ListViewError::InvalidTable(format!(
                "table '{}' has no columns",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(ListViewError::InvalidTable(format!(
                    "table '{}' has a column without a name",
                    self.name
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ListViewError::InvalidTable(format!(
                    "duplicate column '{}' in table '{}'",
                    column.name, self.name
                )));
            }
        }

        let mut search_names = HashSet::new();
        for field in &self.search_fields {
            for name in std::iter::once(&field.name).chain(field.aliases.iter()) {
                if !search_names.insert(name.to_lowercase()) {
                    return Err(ListViewError::InvalidTable(format!(
                        "duplicate search field '{}' in table '{}'",
                        name, self.name
                    )));
                }
            }
        }

        if let Some(date_column) = &self.date_column {
            let column = self.require(date_column)?;
            if column.kind != ColumnKind::Date {
                return Err(ListViewError::InvalidTable(format!(
                    "date column '{}' is not a date column",
                    date_column
                )));
            }
        }

        Ok(())
    }
}
