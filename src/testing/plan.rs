//! Test plan document types
//!
//! A plan is a YAML stream. Each document maps suite names to an ordered
//! list of steps:
//!
//! ```yaml
//! create_pet:
//!   - name: add
//!     method: POST
//!     path: /pet
//!     body: {name: rex}
//!     expect: {status: 200}
//!   - name: fetch
//!     path: /pet/{petId}
//!     path_params: {petId: 1}
//! ---
//! list_pets:
//!   - name: list
//!     path: /pet/findByStatus
//!     query: {status: available}
//! ```

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::common::{Error, Result};

/// All suites of a plan, in document order
#[derive(Debug, Clone, Default)]
pub struct TestPlan {
    pub suites: Vec<TestSuite>,
}

/// A named, ordered list of API calls
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub name: String,
    pub steps: Vec<TestStep>,
}

/// One API call
#[derive(Deserialize, Debug, Clone)]
pub struct TestStep {
    pub name: String,
    /// HTTP method (default: GET)
    #[serde(default = "default_method")]
    pub method: String,
    /// Path relative to the spec's base URL; `{param}` segments are filled
    /// from `path_params`
    pub path: String,
    #[serde(default)]
    pub path_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub query: BTreeMap<String, Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Sent as JSON
    pub body: Option<Value>,
    pub expect: Option<StepExpectation>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// What a step's response must look like
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StepExpectation {
    /// Exact status; any 2xx passes when unset
    pub status: Option<u16>,
}

impl TestPlan {
    /// Load a plan from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content).map_err(|error| Error::PlanLoad {
            path: path.display().to_string(),
            error,
        })
    }

    /// Parse a plan from a YAML stream
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut plan = TestPlan::default();

        for document in serde_yaml::Deserializer::from_str(content) {
            let value = Value::deserialize(document).map_err(|e| e.to_string())?;
            let suites = match value {
                Value::Null => continue,
                Value::Mapping(suites) => suites,
                _ => return Err("each plan document must map suite names to steps".to_string()),
            };

            for (name, steps) in suites {
                let Some(name) = name.as_str().map(str::to_string) else {
                    return Err(format!("suite name {name:?} is not a string"));
                };
                if plan.suite(&name).is_some() {
                    return Err(format!("duplicate suite '{name}'"));
                }
                let steps: Vec<TestStep> = match steps {
                    Value::Null => Vec::new(),
                    steps => serde_yaml::from_value(steps)
                        .map_err(|e| format!("suite '{name}': {e}"))?,
                };
                plan.suites.push(TestSuite { name, steps });
            }
        }

        Ok(plan)
    }

    pub fn suite(&self, name: &str) -> Option<&TestSuite> {
        self.suites.iter().find(|s| s.name == name)
    }

    pub fn suite_names(&self) -> Vec<String> {
        self.suites.iter().map(|s| s.name.clone()).collect()
    }
}

impl TestStep {
    /// Full request URL for this step under `base_url`
    ///
    /// Parameter values are percent-encoded as single path segments, so a
    /// value can't add segments, a query or a fragment.
    pub fn url(&self, base_url: &str) -> Result<String> {
        let mut url = reqwest::Url::parse(base_url)
            .map_err(|e| Error::BaseUrl(format!("'{base_url}': {e}")))?;

        let segments = self
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| self.fill_segment(segment))
            .collect::<Result<Vec<_>>>()?;

        url.path_segments_mut()
            .map_err(|_| Error::BaseUrl(format!("'{base_url}' can't have a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    /// Replace every `{name}` token of one template segment
    ///
    /// Only the template is scanned; substituted values are never re-expanded.
    fn fill_segment(&self, template: &str) -> Result<String> {
        let mut filled = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let param = &rest[start + 1..start + len];
            let value = self.path_params.get(param).ok_or_else(|| {
                Error::TestAssertion(format!(
                    "step '{}': no value for path parameter '{}'",
                    self.name, param
                ))
            })?;
            let value = scalar_to_string(value).ok_or_else(|| {
                Error::TestAssertion(format!(
                    "step '{}': path parameter '{}' is not a scalar",
                    self.name, param
                ))
            })?;

            filled.push_str(&rest[..start]);
            filled.push_str(&value);
            rest = &rest[start + len + 1..];
        }
        filled.push_str(rest);
        Ok(filled)
    }

    /// Query parameters rendered as strings
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>> {
        self.query
            .iter()
            .map(|(key, value)| {
                scalar_to_string(value)
                    .map(|v| (key.clone(), v))
                    .ok_or_else(|| {
                        Error::TestAssertion(format!(
                            "step '{}': query parameter '{}' is not a scalar",
                            self.name, key
                        ))
                    })
            })
            .collect()
    }

    /// Whether `status` satisfies this step's expectation
    pub fn accepts(&self, status: u16) -> bool {
        match self.expect.as_ref().and_then(|e| e.status) {
            Some(expected) => status == expected,
            None => (200..300).contains(&status),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
