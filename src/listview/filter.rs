use std::collections::BTreeMap;
use std::fmt;

use super::record::Listable;

/// A categorical filter over one record field.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub name: &'static str,
    /// Closed set of valid values; empty means any value is accepted.
    pub options: &'static [&'static str],
}

impl FilterSpec {
    pub const fn new(name: &'static str, options: &'static [&'static str]) -> Self {
        Self { name, options }
    }

    pub fn accepts(&self, selection: &Selection) -> bool {
        match selection {
            Selection::All => true,
            Selection::Value(v) => self.options.is_empty() || self.options.contains(&v.as_str()),
        }
    }
}

/// Selected value of a categorical filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Value(String),
}

impl Selection {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::Value(trimmed.to_string())
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Value(v) => f.write_str(v),
        }
    }
}

/// Free-text query AND categorical selections, folded into one predicate.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    needle: Option<String>,
    selections: BTreeMap<String, Selection>,
}

impl Predicate {
    /// A whitespace-only query matches everything; any other query is a
    /// case-insensitive substring, surrounding spaces included.
    pub fn new(query: &str, selections: &BTreeMap<String, Selection>) -> Self {
        Self {
            needle: (!query.trim().is_empty()).then(|| query.to_lowercase()),
            selections: selections.clone(),
        }
    }

    /// Predicate with only the text part.
    pub fn query_only(query: &str) -> Self {
        Self::new(query, &BTreeMap::new())
    }

    /// Predicate with only the categorical part.
    pub fn selections_only(selections: &BTreeMap<String, Selection>) -> Self {
        Self::new("", selections)
    }

    pub fn matches<T: Listable>(&self, record: &T, searchable: &[&str]) -> bool {
        self.matches_query(record, searchable) && self.matches_selections(record)
    }

    fn matches_query<T: Listable>(&self, record: &T, searchable: &[&str]) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        searchable.iter().any(|name| {
            record
                .field(name)
                .is_some_and(|v| v.to_string().to_lowercase().contains(needle))
        })
    }

    fn matches_selections<T: Listable>(&self, record: &T) -> bool {
        self.selections.iter().all(|(name, selection)| match selection {
            Selection::All => true,
            Selection::Value(wanted) => record
                .field(name)
                .is_some_and(|v| v.to_string() == *wanted),
        })
    }
}

/// Keep the records matching `predicate`, in their original order.
pub fn filter_records<'a, T: Listable>(
    records: impl IntoIterator<Item = &'a T>,
    predicate: &Predicate,
    searchable: &[&str],
) -> Vec<&'a T>
where
    T: 'a,
{
    records
        .into_iter()
        .filter(|r| predicate.matches(*r, searchable))
        .collect()
}
