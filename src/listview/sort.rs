use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

use super::record::{FieldValue, Listable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Numeric,
    Date,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A sortable key. Direction is fixed per key.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub key: &'static str,
    pub kind: SortKind,
    pub direction: Direction,
}

impl SortSpec {
    pub const fn new(key: &'static str, kind: SortKind, direction: Direction) -> Self {
        Self {
            key,
            kind,
            direction,
        }
    }

    /// Compare two records by this key. Missing values rank lowest.
    pub fn compare<T: Listable>(&self, a: &T, b: &T) -> Ordering {
        let left = sort_value(a.field(self.key), self.kind);
        let right = sort_value(b.field(self.key), self.kind);
        let ord = compare_keys(left.as_ref(), right.as_ref());
        match self.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Time(NaiveDateTime),
    Text(String),
}

fn sort_value(value: Option<FieldValue>, kind: SortKind) -> Option<SortValue> {
    let value = value?;
    match kind {
        SortKind::Numeric => value.as_number().map(SortValue::Number),
        SortKind::Date => match value {
            FieldValue::Date(d) => d.and_hms_opt(0, 0, 0).map(SortValue::Time),
            FieldValue::Text(s) | FieldValue::Tag(s) => parse_timestamp(&s).map(SortValue::Time),
            _ => None,
        },
        SortKind::Text => Some(SortValue::Text(value.to_string().to_lowercase())),
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or an RFC 3339 timestamp.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn compare_keys(a: Option<&SortValue>, b: Option<&SortValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(SortValue::Number(x)), Some(SortValue::Number(y))) => x.total_cmp(y),
        (Some(SortValue::Time(x)), Some(SortValue::Time(y))) => x.cmp(y),
        (Some(SortValue::Text(x)), Some(SortValue::Text(y))) => x.cmp(y),
        // one kind per key, so mixed variants never meet
        _ => Ordering::Equal,
    }
}

/// Stable sort of `items` by `spec`.
pub fn sort_records<T: Listable>(items: &mut [&T], spec: &SortSpec) {
    items.sort_by(|a, b| spec.compare(*a, *b));
}
