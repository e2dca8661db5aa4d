use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::listview::ViewState;

/// Persisted per-dataset list state.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct State {
    #[serde(default)]
    pub views: BTreeMap<String, ViewState>,
}

impl State {
    pub fn view(&self, dataset: &str) -> ViewState {
        self.views.get(dataset).cloned().unwrap_or_default()
    }

    pub fn set_view(&mut self, dataset: &str, view: ViewState) {
        if view == ViewState::default() {
            self.views.remove(dataset);
        } else {
            self.views.insert(dataset.to_string(), view);
        }
    }
}
