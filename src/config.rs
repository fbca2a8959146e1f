use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ShellError;

const DEFAULT_HISTORY_FILE: &str = ".evalshell_history";

/// Session configuration.
///
/// The shell itself never interprets these fields; it keeps a shared reference so that
/// initializers and commands can read them. `settings` is free-form space for extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub prompt: String,
    pub continuation_prompt: String,
    pub history_file: Option<PathBuf>,
    pub history_size: usize,
    pub log_filter: Option<String>,
    pub settings: Map<String, JsonValue>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "In: ".to_string(),
            continuation_prompt: "... ".to_string(),
            history_file: None,
            history_size: 1000,
            log_filter: None,
            settings: Map::new(),
        }
    }
}

impl ShellConfig {
    pub fn load(path: &Path) -> Result<Self, ShellError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| ShellError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Where the REPL keeps its line history: the configured file, else a dotfile in HOME.
    pub fn resolved_history_file(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| home::home_dir().map(|home| home.join(DEFAULT_HISTORY_FILE)))
    }

    pub fn setting(&self, key: &str) -> Option<&JsonValue> {
        self.settings.get(key)
    }
}
