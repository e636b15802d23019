//! API spec loading
//!
//! Only as much of the spec is understood as plan execution needs: where the
//! API lives. References, schemas and validation are left alone.

use serde_yaml::Value;
use std::path::Path;

use crate::common::{Error, Result};

/// Source of the API description a plan runs against
pub trait SpecStore {
    /// Parse the spec at `path`, replacing anything loaded before
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Base URL that plan step paths are appended to
    fn base_url(&self) -> Option<String>;
}

/// Swagger 2 / OpenAPI 3 document, YAML or JSON
#[derive(Debug, Default)]
pub struct SwaggerStore {
    document: Option<Value>,
}

impl SwaggerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(path: &Path, content: &str) -> Result<Value> {
        let load_error = |error: String| Error::SpecLoad {
            path: path.display().to_string(),
            error,
        };

        let document: Value = serde_yaml::from_str(content).map_err(|e| load_error(e.to_string()))?;
        let Value::Mapping(map) = &document else {
            return Err(load_error("document is not a mapping".to_string()));
        };
        if !map.contains_key("swagger") && !map.contains_key("openapi") {
            return Err(load_error(
                "neither a 'swagger' nor an 'openapi' version key is present".to_string(),
            ));
        }
        Ok(document)
    }
}

impl SpecStore for SwaggerStore {
    fn load(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let document = Self::parse(path, &content)?;

        self.document = Some(document);
        tracing::debug!(path = %path.display(), base_url = ?self.base_url(), "loaded spec");
        Ok(())
    }

    fn base_url(&self) -> Option<String> {
        let document = self.document.as_ref()?;

        // OpenAPI 3
        if let Some(url) = document
            .get("servers")
            .and_then(|s| s.get(0))
            .and_then(|s| s.get("url"))
            .and_then(Value::as_str)
        {
            return Some(url.trim_end_matches('/').to_string());
        }

        // Swagger 2
        let host = document.get("host").and_then(Value::as_str)?;
        let scheme = document
            .get("schemes")
            .and_then(|s| s.get(0))
            .and_then(Value::as_str)
            .unwrap_or("http");
        let base_path = document
            .get("basePath")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim_end_matches('/');

        Some(format!("{scheme}://{host}{base_path}"))
    }
}
