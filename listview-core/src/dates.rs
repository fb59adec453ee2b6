//! Calendar-relative date handling.
//!
//! Two independent code paths live here:
//! - bucketing: classify a record date relative to today into a named,
//!   chronologically sortable bucket (used by grouping)
//! - presets: compute explicit `[start, end]` instants for range filtering
//!
//! Dates are compared as local calendar days.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ListViewError, ListViewResult};

/// Today's date on the local clock.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a record timestamp into local time.
///
/// Accepts RFC 3339 strings, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// plain `YYYY-MM-DD` and millisecond epoch numbers. Anything else is None.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Local).naive_local())
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(start_of_day))
                .ok()
        }
        Value::Number(n) => {
            let ms = n.as_i64()?;
            DateTime::<Utc>::from_timestamp_millis(ms)
                .map(|dt| dt.with_timezone(&Local).naive_local())
        }
        _ => None,
    }
}

/// Parse a record timestamp and truncate it to its calendar day.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_datetime(value).map(|dt| dt.date())
}

/// Sortable epoch milliseconds; missing or unparseable dates sort as 0.
pub fn epoch_millis(value: &Value) -> i64 {
    parse_datetime(value)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Format a day the way exact-date groups are labelled, e.g. `Jan 15, 2025`.
pub fn format_exact(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + chrono::Duration::days(1) - chrono::Duration::milliseconds(1)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    let (year, month) = if month > 12 { (year + 1, month - 12) } else { (year, month) };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn quarter_of(date: NaiveDate) -> u32 {
    date.month0() / 3
}

/// Relative-time bucket of a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateBucket {
    Today,
    Yesterday,
    ThisWeek { start: NaiveDate, end: NaiveDate },
    LastWeek { start: NaiveDate, end: NaiveDate },
    ThisMonth,
    LastMonth,
    ThisQuarter,
    LastQuarter,
    ThisYear,
    LastYear,
    Older(i32),
}

impl DateBucket {
    /// Classify `date` relative to `today`. First matching rule wins.
    pub fn classify(today: NaiveDate, date: NaiveDate) -> Self {
        let days = (today - date).num_days();

        if days == 0 {
            return DateBucket::Today;
        }
        if days == 1 {
            return DateBucket::Yesterday;
        }
        if (0..7).contains(&days) {
            return DateBucket::ThisWeek {
                start: today - chrono::Duration::days(6),
                end: today,
            };
        }
        if (7..14).contains(&days) {
            return DateBucket::LastWeek {
                start: today - chrono::Duration::days(13),
                end: today - chrono::Duration::days(7),
            };
        }

        if date.year() == today.year() && date.month() == today.month() {
            return DateBucket::ThisMonth;
        }

        let (last_month_year, last_month) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };
        if date.year() == last_month_year && date.month() == last_month {
            return DateBucket::LastMonth;
        }

        let quarter = quarter_of(today);
        if quarter_of(date) == quarter && date.year() == today.year() {
            return DateBucket::ThisQuarter;
        }

        let (last_quarter_year, last_quarter) = if quarter == 0 {
            (today.year() - 1, 3)
        } else {
            (today.year(), quarter - 1)
        };
        if quarter_of(date) == last_quarter && date.year() == last_quarter_year {
            return DateBucket::LastQuarter;
        }

        if date.year() == today.year() {
            return DateBucket::ThisYear;
        }
        if date.year() == today.year() - 1 {
            return DateBucket::LastYear;
        }

        DateBucket::Older(date.year())
    }

    /// Two-digit chronological position of the bucket.
    pub fn ordinal(&self) -> u8 {
        match self {
            DateBucket::Today => 1,
            DateBucket::Yesterday => 2,
            DateBucket::ThisWeek { .. } => 3,
            DateBucket::LastWeek { .. } => 4,
            DateBucket::ThisMonth => 5,
            DateBucket::LastMonth => 6,
            DateBucket::ThisQuarter => 7,
            DateBucket::LastQuarter => 8,
            DateBucket::ThisYear => 9,
            DateBucket::LastYear => 10,
            DateBucket::Older(_) => 11,
        }
    }

    /// Label with its ordinal prefix, e.g. `03_This Week (Jan 9 - Jan 15)`.
    /// Lexicographic order of these labels is chronological order.
    pub fn sort_label(&self) -> String {
        format!("{:02}_{}", self.ordinal(), self)
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBucket::Today => write!(f, "Today"),
            DateBucket::Yesterday => write!(f, "Yesterday"),
            DateBucket::ThisWeek { start, end } => write!(
                f,
                "This Week ({} - {})",
                start.format("%b %-d"),
                end.format("%b %-d")
            ),
            DateBucket::LastWeek { start, end } => write!(
                f,
                "Last Week ({} - {})",
                start.format("%b %-d"),
                end.format("%b %-d")
            ),
            DateBucket::ThisMonth => write!(f, "This Month"),
            DateBucket::LastMonth => write!(f, "Last Month"),
            DateBucket::ThisQuarter => write!(f, "This Quarter"),
            DateBucket::LastQuarter => write!(f, "Last Quarter"),
            DateBucket::ThisYear => write!(f, "This Year"),
            DateBucket::LastYear => write!(f, "Last Year"),
            DateBucket::Older(year) => write!(f, "Older ({})", year),
        }
    }
}

/// Remove a `NN_` ordinal prefix from a bucket label.
pub fn strip_ordinal(label: &str) -> &str {
    let bytes = label.as_bytes();
    if bytes.len() >= 3
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b'_'
    {
        &label[3..]
    } else {
        label
    }
}

/// Named range shortcuts offered next to the date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePreset {
    Today,
    ThisWeek,
    ThisMonth,
    ThisQuarter,
    ThisYear,
}

/// Explicit instants produced by a preset; both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DatePreset {
    /// Compute the preset's `[start, end]` relative to `today`.
    pub fn range(&self, today: NaiveDate) -> PresetRange {
        let (first, last) = match self {
            DatePreset::Today => (today, today),
            DatePreset::ThisWeek => {
                let back = today.weekday().num_days_from_sunday() as i64;
                let sunday = today - chrono::Duration::days(back);
                (sunday, sunday + chrono::Duration::days(6))
            }
            DatePreset::ThisMonth => {
                let first = first_of_month(today.year(), today.month());
                let next = first_of_month(today.year(), today.month() + 1);
                (first, next - chrono::Duration::days(1))
            }
            DatePreset::ThisQuarter => {
                let start_month = quarter_of(today) * 3 + 1;
                let first = first_of_month(today.year(), start_month);
                let next = first_of_month(today.year(), start_month + 3);
                (first, next - chrono::Duration::days(1))
            }
            DatePreset::ThisYear => (
                first_of_month(today.year(), 1),
                first_of_month(today.year() + 1, 1) - chrono::Duration::days(1),
            ),
        };

        PresetRange {
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }
}

impl FromStr for DatePreset {
    type Err = ListViewError;

    fn from_str(s: &str) -> ListViewResult<Self> {
        match s {
            "today" => Ok(DatePreset::Today),
            "thisWeek" => Ok(DatePreset::ThisWeek),
            "thisMonth" => Ok(DatePreset::ThisMonth),
            "thisQuarter" => Ok(DatePreset::ThisQuarter),
            "thisYear" => Ok(DatePreset::ThisYear),
            _ => Err(ListViewError::UnknownPreset(s.to_string())),
        }
    }
}

/// Whole-day date filter; both bounds inclusive, either may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Range covering the days of a preset.
    pub fn from_preset(preset: DatePreset, today: NaiveDate) -> Self {
        let range = preset.range(today);
        Self {
            start: Some(range.start.date()),
            end: Some(range.end.date()),
        }
    }

    /// Parse `YYYY-MM-DD` bounds as entered in date inputs; blank means open.
    pub fn parse(start: &str, end: &str) -> ListViewResult<Self> {
        Ok(Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

fn parse_bound(input: &str) -> ListViewResult<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ListViewError::InvalidDate(input.to_string()))
}
