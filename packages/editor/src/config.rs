use crate::errors::EditorError;
use crate::job_manager::DEFAULT_MAX_UNDO_LEVELS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "stagecraft.config.json";

/// Editor settings file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo levels kept before the oldest is dropped (0 = unlimited)
    #[serde(default = "default_max_undo_levels")]
    pub max_undo_levels: usize,

    /// Record selection changes as undoable jobs
    #[serde(default)]
    pub record_selection_jobs: bool,

    /// Lint the document after every push, undo and redo
    #[serde(default)]
    pub validate_after_edit: bool,
}

fn default_max_undo_levels() -> usize {
    DEFAULT_MAX_UNDO_LEVELS
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when the file
    /// is missing
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            debug!(path = %config_path.display(), "loaded editor config");
            Self::from_json(&content)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: default_max_undo_levels(),
            record_selection_jobs: false,
            validate_after_edit: false,
        }
    }
}
