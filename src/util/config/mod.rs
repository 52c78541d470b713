//! PTTY configuration
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Explicit config file (--config)
//! 3. User-level (~/.config/ptty/config.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use ptty::util::config::load_user_config;
//!
//! let config = load_user_config().unwrap_or_default();
//! assert!(config.repl.columns > 0);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// User-level configuration for PTTY
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserConfig {
    /// REPL settings
    #[serde(default)]
    pub repl: ReplConfig,
}

/// REPL configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplConfig {
    /// Prompt shown when a new statement is expected
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Prompt shown inside a multi-line block
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
    /// Number of columns in member listings
    #[serde(default = "default_columns")]
    pub columns: usize,
    /// Width each listed member is padded to
    #[serde(default = "default_pad")]
    pub pad: usize,
    /// Execute complete single-line statements without waiting for a blank line
    #[serde(default = "default_eager_statements")]
    pub eager_statements: bool,
    /// History file path
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// History size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Use vi key bindings in the line editor
    #[serde(default)]
    pub vi_mode: bool,
}

fn default_prompt() -> String {
    ">>> ".to_string()
}

fn default_continuation_prompt() -> String {
    "... ".to_string()
}

fn default_columns() -> usize {
    4
}

fn default_pad() -> usize {
    24
}

fn default_eager_statements() -> bool {
    true
}

fn default_history_size() -> usize {
    1000
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            continuation_prompt: default_continuation_prompt(),
            columns: default_columns(),
            pad: default_pad(),
            eager_statements: default_eager_statements(),
            history_file: None,
            history_size: default_history_size(),
            vi_mode: false,
        }
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("ptty"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("ptty"));
    }

    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("ptty"));
    }

    None
}

/// Get the user config file path (~/.config/ptty/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    match get_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(UserConfig::default()),
    }
}

/// Load configuration from an explicit file
pub fn load_config_from(path: &Path) -> Result<UserConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<UserConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Render configuration as TOML text
pub fn render_config(config: &UserConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_interactive_protocol() {
        let config = UserConfig::default();
        assert_eq!(config.repl.prompt, ">>> ");
        assert_eq!(config.repl.continuation_prompt, "... ");
        assert_eq!(config.repl.columns, 4);
        assert_eq!(config.repl.pad, 24);
        assert!(config.repl.eager_statements);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = parse_config("[repl]\ncolumns = 6\n").unwrap();
        assert_eq!(config.repl.columns, 6);
        assert_eq!(config.repl.pad, 24);
        assert_eq!(config.repl.prompt, ">>> ");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), UserConfig::default());
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let err = parse_config("[repl]\ncolumns = \"many\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[repl]\nprompt = \"py> \"\neager_statements = false").unwrap();
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.repl.prompt, "py> ");
        assert!(!config.repl.eager_statements);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_render_then_parse() {
        let mut config = UserConfig::default();
        config.repl.columns = 3;
        config.repl.history_file = Some(PathBuf::from("/tmp/ptty_history"));
        let text = render_config(&config).unwrap();
        assert!(text.contains("columns = 3"));
        assert_eq!(parse_config(&text).unwrap(), config);
    }
}
