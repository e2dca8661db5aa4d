use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum RecliqError {
    #[error("Config directory not found at {0}. Run 'recliq init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {reason}")]
    ConfigWrite { path: PathBuf, reason: String },

    #[error("Unknown dataset '{0}'. Use 'recliq datasets' to see available datasets.")]
    UnknownDataset(String),

    #[error("Record '{id}' not found in {dataset}")]
    RecordNotFound { dataset: String, id: String },

    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    #[error("Unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("Invalid value '{value}' for filter '{filter}'. Expected one of: all, {expected}")]
    InvalidFilterValue {
        filter: String,
        value: String,
        expected: String,
    },

    #[error("Invalid filter format '{0}'. Expected 'name=value' (e.g., 'status=paid')")]
    InvalidFilterFormat(String),

    #[error("Unknown sort key '{0}'")]
    UnknownSortKey(String),

    #[error("Invalid {what} '{value}'. Expected one of: {expected}")]
    InvalidChoice {
        what: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Drawer has no record to act on")]
    DrawerClosed,

    #[error("Unknown action '{action}' for {title}")]
    UnknownAction { title: String, action: String },

    #[error("Action '{action}' requires the {required} role (current role: {role})")]
    Forbidden {
        action: String,
        required: String,
        role: String,
    },

    #[error("Cannot continue from the {step} step: {reason}")]
    StepIncomplete { step: String, reason: String },

    #[error("Pricing rule can only be submitted from the review step")]
    NotOnReviewStep,

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecliqError>;
