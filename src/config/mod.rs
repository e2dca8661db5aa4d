mod settings;
mod state;

pub use settings::{ApiSettings, Config, ExportSettings, ListSettings, SessionSettings};
pub use state::State;

use crate::error::{RecliqError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG config dir, or ~/.recliq/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "recliq") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        RecliqError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".recliq"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the export directory; relative paths live under the config dir.
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    let path = expand_path(output_dir);
    if path.is_absolute() {
        path
    } else {
        config_dir.join(path)
    }
}

/// Fail unless `init` has created the config directory.
pub fn ensure_initialized(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        return Err(RecliqError::ConfigNotFound(config_dir.to_path_buf()));
    }
    Ok(())
}

/// Load config.toml (defaults if missing)
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| RecliqError::ConfigParse { path, source: e })
}

/// Load state.toml (defaults if missing)
pub fn load_state(config_dir: &Path) -> Result<State> {
    let path = config_dir.join("state.toml");
    if !path.exists() {
        return Ok(State::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| RecliqError::ConfigParse { path, source: e })
}

/// Save state.toml
pub fn save_state(config_dir: &Path, state: &State) -> Result<()> {
    let path = config_dir.join("state.toml");
    let content = toml::to_string_pretty(state).map_err(|e| RecliqError::ConfigWrite {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    fs::write(path, content)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[list]
page_size = 10
currency_symbol = "$"

[export]
output_dir = "exports"      # relative to this directory, or absolute / ~/...
scope = "page"              # page | filtered | all
quoting = "rfc4180"         # rfc4180 | legacy (no escaping)

[api]
base_url = "http://localhost:8000/api"
timeout_secs = 10

[session]
role = "viewer"             # viewer | operations | finance_admin
"#;
