use serde::{Deserialize, Serialize};

use crate::drawer::Role;
use crate::listview::{CsvQuoting, ExportScope};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub list: ListSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ListSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExportSettings {
    /// Relative paths resolve against the config directory
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub scope: ExportScope,
    #[serde(default)]
    pub quoting: CsvQuoting,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            scope: ExportScope::default(),
            quoting: CsvQuoting::default(),
        }
    }
}

fn default_output_dir() -> String {
    "exports".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SessionSettings {
    #[serde(default)]
    pub role: Role,
}
