use chrono::NaiveDate;
use std::fmt;

/// A scalar value exposed by a record for display, search, filtering and sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Enumerated status or category value (e.g. `paid`, `at_risk`)
    Tag(String),
    /// Whole currency units
    Money(i64),
    Number(f64),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn tag(value: impl Into<String>) -> Self {
        FieldValue::Tag(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Money(v) => Some(*v as f64),
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(s) | FieldValue::Tag(s) => s.trim().parse().ok(),
            FieldValue::Date(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Tag(s) => f.write_str(s),
            FieldValue::Money(v) => write!(f, "{v}"),
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A record that can be shown in a list view.
pub trait Listable {
    /// Opaque identifier, unique within its dataset.
    fn id(&self) -> &str;

    /// Value of the named field, or `None` when the record has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_value() {
        assert_eq!(FieldValue::Money(125000).to_string(), "125000");
        assert_eq!(FieldValue::tag("paid").to_string(), "paid");
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(FieldValue::Date(date).to_string(), "2025-03-09");
    }

    #[test]
    fn numeric_view_of_values() {
        assert_eq!(FieldValue::Money(40).as_number(), Some(40.0));
        assert_eq!(FieldValue::text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(FieldValue::text("n/a").as_number(), None);
    }
}
