//! One filter -> sort -> paginate -> export pipeline shared by every list.
//!
//! A [`ListView`] borrows an immutable record store and owns only view
//! state: the search query, categorical selections, sort key and page.
//! Changing the query, a selection or the sort key resets to page 1;
//! out-of-range pages clamp to the last page.

mod export;
mod filter;
mod paginate;
mod record;
mod sort;

pub use export::{
    csv_filename, to_csv, Column, CsvQuoting, DeliveredFile, DirectorySink, ExportScope,
    FileSink, MemorySink, CSV_MIME,
};
pub use filter::{filter_records, FilterSpec, Predicate, Selection};
pub use paginate::{PageWindow, Paginator};
pub use record::{FieldValue, Listable};
pub use sort::{parse_timestamp, sort_records, Direction, SortKind, SortSpec};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RecliqError, Result};

/// Static description of a list: what is searchable, filterable and sortable.
#[derive(Debug, Clone)]
pub struct ListSchema {
    pub searchable: &'static [&'static str],
    pub filters: &'static [FilterSpec],
    pub sorts: &'static [SortSpec],
    pub default_sort: Option<&'static str>,
}

impl ListSchema {
    pub fn filter(&self, name: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn sort(&self, key: &str) -> Option<&SortSpec> {
        self.sorts.iter().find(|s| s.key == key)
    }
}

/// Per-list view state. Serializable so a route can keep it between visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            page: 1,
        }
    }
}

/// A page of records together with its bounds.
#[derive(Debug)]
pub struct Page<'a, T> {
    pub records: Vec<&'a T>,
    pub window: PageWindow,
}

pub struct ListView<'a, T: Listable> {
    records: &'a [T],
    schema: &'a ListSchema,
    paginator: Paginator,
    query: String,
    selections: BTreeMap<String, Selection>,
    sort: Option<&'a SortSpec>,
    page: usize,
    cache: Option<Vec<usize>>,
}

/// Build a list view over `records`.
pub fn make_list_view<'a, T: Listable>(
    records: &'a [T],
    schema: &'a ListSchema,
    page_size: usize,
) -> Result<ListView<'a, T>> {
    ListView::new(records, schema, page_size)
}

impl<'a, T: Listable> ListView<'a, T> {
    pub fn new(records: &'a [T], schema: &'a ListSchema, page_size: usize) -> Result<Self> {
        let sort = match schema.default_sort {
            Some(key) => Some(
                schema
                    .sort(key)
                    .ok_or_else(|| RecliqError::UnknownSortKey(key.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            records,
            schema,
            paginator: Paginator::new(page_size)?,
            query: String::new(),
            selections: BTreeMap::new(),
            sort,
            page: 1,
            cache: None,
        })
    }

    /// Apply a saved view state. The saved page is kept (clamped on read).
    pub fn with_state(mut self, state: &ViewState) -> Result<Self> {
        self.set_query(&state.query);
        for (name, value) in &state.filters {
            self.set_filter(name, value)?;
        }
        if let Some(key) = &state.sort {
            self.set_sort(key)?;
        }
        self.page = state.page.max(1);
        Ok(self)
    }

    /// Snapshot of the current view state.
    pub fn state(&mut self) -> ViewState {
        ViewState {
            query: self.query.clone(),
            filters: self
                .selections
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            sort: self.sort.map(|s| s.key.to_string()),
            page: self.current_page(),
        }
    }

    pub fn schema(&self) -> &ListSchema {
        self.schema
    }

    pub fn page_size(&self) -> usize {
        self.paginator.page_size()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        if self.query != query {
            self.query = query.to_string();
            self.invalidate();
        }
    }

    /// Select `value` (or `all`) for the categorical filter `name`.
    pub fn set_filter(&mut self, name: &str, value: &str) -> Result<()> {
        let schema = self.schema;
        let spec = schema
            .filter(name)
            .ok_or_else(|| RecliqError::UnknownFilter(name.to_string()))?;
        let selection = Selection::parse(value);
        if !spec.accepts(&selection) {
            return Err(RecliqError::InvalidFilterValue {
                filter: name.to_string(),
                value: value.to_string(),
                expected: spec.options.join(", "),
            });
        }

        let changed = match &selection {
            Selection::All => self.selections.remove(name).is_some(),
            Selection::Value(_) => {
                self.selections.insert(name.to_string(), selection.clone()) != Some(selection)
            }
        };
        if changed {
            self.invalidate();
        }
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        if !self.selections.is_empty() {
            self.selections.clear();
            self.invalidate();
        }
    }

    pub fn set_sort(&mut self, key: &str) -> Result<()> {
        let schema = self.schema;
        let spec = schema
            .sort(key)
            .ok_or_else(|| RecliqError::UnknownSortKey(key.to_string()))?;
        if self.sort.map(|s| s.key) != Some(spec.key) {
            self.sort = Some(spec);
            self.invalidate();
        }
        Ok(())
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    fn invalidate(&mut self) {
        self.cache = None;
        self.page = 1;
    }

    fn indices(&mut self) -> &[usize] {
        if self.cache.is_none() {
            let predicate = Predicate::new(&self.query, &self.selections);
            let searchable = self.schema.searchable;
            let mut matched: Vec<(usize, &T)> = self
                .records
                .iter()
                .enumerate()
                .filter(|(_, r)| predicate.matches(*r, searchable))
                .collect();
            if let Some(spec) = self.sort {
                matched.sort_by(|(_, a), (_, b)| spec.compare(*a, *b));
            }
            tracing::debug!(
                query = %self.query,
                matched = matched.len(),
                total = self.records.len(),
                sort = self.sort.map(|s| s.key).unwrap_or("none"),
                "recomputed list view"
            );
            self.cache = Some(matched.into_iter().map(|(i, _)| i).collect());
        }
        self.cache.as_deref().unwrap_or_default()
    }

    /// Every record passing the filters, in sort order.
    pub fn filtered_sorted(&mut self) -> Vec<&'a T> {
        let records = self.records;
        self.indices().iter().map(|&i| &records[i]).collect()
    }

    pub fn filtered_count(&mut self) -> usize {
        self.indices().len()
    }

    pub fn total_pages(&mut self) -> usize {
        let count = self.filtered_count();
        self.paginator.total_pages(count)
    }

    /// The current page after clamping against the filtered count.
    pub fn current_page(&mut self) -> usize {
        let count = self.filtered_count();
        self.paginator.clamp_page(count, self.page)
    }

    /// Records on page `page` (1-based, clamped).
    pub fn page(&mut self, page: usize) -> Page<'a, T> {
        let records = self.records;
        let paginator = self.paginator;
        let indices = self.indices();
        let window = paginator.window(indices.len(), page);
        Page {
            records: indices[window.start..window.end]
                .iter()
                .map(|&i| &records[i])
                .collect(),
            window,
        }
    }

    pub fn visible(&mut self) -> Page<'a, T> {
        self.page(self.page)
    }

    pub fn export_csv(
        &mut self,
        columns: &[Column<T>],
        scope: ExportScope,
        quoting: CsvQuoting,
    ) -> Result<String> {
        let records: Vec<&T> = match scope {
            ExportScope::Page => self.visible().records,
            ExportScope::Filtered => self.filtered_sorted(),
            ExportScope::All => self.records.iter().collect(),
        };
        tracing::info!(%scope, rows = records.len(), "exporting CSV");
        to_csv(&records, columns, quoting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Job {
        id: String,
        crew: &'static str,
        kind: &'static str,
        weight: i64,
    }

    impl Listable for Job {
        fn id(&self) -> &str {
            &self.id
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "id" => Some(FieldValue::text(self.id.clone())),
                "crew" => Some(FieldValue::text(self.crew)),
                "kind" => Some(FieldValue::tag(self.kind)),
                "weight" => Some(FieldValue::Number(self.weight as f64)),
                _ => None,
            }
        }
    }

    static SCHEMA: ListSchema = ListSchema {
        searchable: &["id", "crew"],
        filters: &[FilterSpec::new("kind", &["plastic", "glass", "metal"])],
        sorts: &[SortSpec::new("weight", SortKind::Numeric, Direction::Descending)],
        default_sort: None,
    };

    fn jobs(n: usize) -> Vec<Job> {
        let kinds = ["plastic", "glass", "metal"];
        let crews = ["North", "South"];
        (0..n)
            .map(|i| Job {
                id: format!("JOB-{i:03}"),
                crew: crews[i % 2],
                kind: kinds[i % 3],
                weight: (i as i64 * 7) % 11,
            })
            .collect()
    }

    fn ids(records: &[&Job]) -> Vec<String> {
        records.iter().map(|j| j.id.clone()).collect()
    }

    #[test]
    fn filter_change_resets_page() {
        let jobs = jobs(40);
        let mut view = ListView::new(&jobs, &SCHEMA, 5).unwrap();
        view.set_page(4);
        assert_eq!(view.current_page(), 4);
        view.set_filter("kind", "glass").unwrap();
        assert_eq!(view.current_page(), 1);
        view.set_page(2);
        view.set_query("south");
        assert_eq!(view.current_page(), 1);
        view.set_page(2);
        view.set_sort("weight").unwrap();
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn unchanged_inputs_keep_page() {
        let jobs = jobs(40);
        let mut view = ListView::new(&jobs, &SCHEMA, 5).unwrap();
        view.set_filter("kind", "metal").unwrap();
        view.set_page(2);
        view.set_filter("kind", "metal").unwrap();
        view.set_query("");
        assert_eq!(view.current_page(), 2);
    }

    #[test]
    fn rejects_unknown_filter_sort_and_values() {
        let jobs = jobs(3);
        let mut view = ListView::new(&jobs, &SCHEMA, 5).unwrap();
        assert!(matches!(
            view.set_filter("crew", "North"),
            Err(RecliqError::UnknownFilter(_))
        ));
        assert!(matches!(
            view.set_filter("kind", "paper"),
            Err(RecliqError::InvalidFilterValue { .. })
        ));
        assert!(matches!(
            view.set_sort("crew"),
            Err(RecliqError::UnknownSortKey(_))
        ));
    }

    #[test]
    fn pipeline_filters_then_sorts_then_pages() {
        let jobs = jobs(30);
        let mut view = ListView::new(&jobs, &SCHEMA, 4).unwrap();
        view.set_filter("kind", "plastic").unwrap();
        view.set_sort("weight").unwrap();

        let all = view.filtered_sorted();
        assert_eq!(all.len(), 10);
        assert!(all.iter().all(|j| j.kind == "plastic"));
        assert!(all.windows(2).all(|w| w[0].weight >= w[1].weight));

        let mut rebuilt = Vec::new();
        for page in 1..=view.total_pages() {
            rebuilt.extend(view.page(page).records);
        }
        assert_eq!(ids(&rebuilt), ids(&all));
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let jobs = jobs(25);
        let mut view = ListView::new(&jobs, &SCHEMA, 10).unwrap();
        assert_eq!(view.total_pages(), 3);
        let page = view.page(4);
        assert_eq!(page.window.page, 3);
        assert_eq!(page.records.len(), 5);
    }

    #[test]
    fn state_round_trips_through_view() {
        let jobs = jobs(30);
        let state = ViewState {
            query: "north".into(),
            filters: BTreeMap::from([("kind".to_string(), "glass".to_string())]),
            sort: Some("weight".into()),
            page: 2,
        };
        let mut view = ListView::new(&jobs, &SCHEMA, 2).unwrap().with_state(&state).unwrap();
        assert_eq!(view.state(), state);
    }

    #[test]
    fn export_scopes_pick_different_slices() {
        let jobs = jobs(12);
        let mut view = ListView::new(&jobs, &SCHEMA, 3).unwrap();
        view.set_filter("kind", "glass").unwrap();
        let columns = vec![Column::field("ID", "id"), Column::field("Crew", "crew")];

        let page = view.export_csv(&columns, ExportScope::Page, CsvQuoting::Rfc4180).unwrap();
        let filtered = view
            .export_csv(&columns, ExportScope::Filtered, CsvQuoting::Rfc4180)
            .unwrap();
        let all = view.export_csv(&columns, ExportScope::All, CsvQuoting::Rfc4180).unwrap();

        assert_eq!(page.lines().count(), 4);
        assert_eq!(filtered.lines().count(), 5);
        assert_eq!(all.lines().count(), 13);
        assert!(page.starts_with("ID,Crew\nJOB-001,South\n"));
    }

    #[test]
    fn records_are_never_mutated() {
        let jobs = jobs(9);
        let before = ids(&jobs.iter().collect::<Vec<_>>());
        let mut view = ListView::new(&jobs, &SCHEMA, 2).unwrap();
        view.set_sort("weight").unwrap();
        let _ = view.filtered_sorted();
        let _ = view.export_csv(&[Column::field("ID", "id")], ExportScope::All, CsvQuoting::Legacy);
        assert_eq!(ids(&jobs.iter().collect::<Vec<_>>()), before);
    }
}
