//! Workspace credential document
//!
//! Each workspace holds a `.config` YAML mapping with at least an `api_key`.
//! The key is minted once, on the first load that finds no file, and every
//! later load returns whatever is on disk.

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};

/// Key under which the generation-service credential is stored
pub const API_KEY: &str = "api_key";

/// Contents of `<workspace>/.config`
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceConfig {
    path: PathBuf,
    values: Mapping,
}

impl WorkspaceConfig {
    /// Load the workspace config, creating it with a fresh `api_key` if absent
    ///
    /// There is no locking: two first-time loads racing in the same workspace
    /// both write, and the last writer wins.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = config_path(workspace);

        let exists = path.try_exists().map_err(|e| Error::file_read(&path, e))?;
        if !exists {
            let mut values = Mapping::new();
            values.insert(
                Value::from(API_KEY),
                Value::from(uuid::Uuid::new_v4().to_string()),
            );
            let content = serde_yaml::to_string(&values)?;
            std::fs::write(&path, content).map_err(|e| Error::file_write(&path, e))?;
            tracing::info!(path = %path.display(), "created workspace config");
            return Ok(Self { path, values });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))?;
        let values = parse_mapping(&content).map_err(|error| Error::ConfigParse {
            path: path.display().to_string(),
            error,
        })?;
        Ok(Self { path, values })
    }

    /// The credential, if present and a string
    pub fn api_key(&self) -> Option<&str> {
        self.values.get(API_KEY).and_then(Value::as_str)
    }

    /// Any value in the document, including keys mqgo doesn't know about
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_mapping(content: &str) -> std::result::Result<Mapping, String> {
    match serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())? {
        // An empty file deserializes to null; treat it as an empty document
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        other => Err(format!("expected a mapping, found {}", value_kind(&other))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
