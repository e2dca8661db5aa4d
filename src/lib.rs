pub mod api;
pub mod config;
pub mod domain;
pub mod drawer;
pub mod error;
pub mod format;
pub mod listview;
pub mod wizard;

pub use config::{Config, State};
pub use domain::{Dataset, DatasetRecord};
pub use drawer::{ActionRequested, ActionSink, DetailDrawer, DrawerView, Role};
pub use error::{RecliqError, Result};
pub use listview::{make_list_view, Listable, ListSchema, ListView, ViewState};
pub use wizard::{PricingRule, PricingRuleBook, PricingRuleWizard};
