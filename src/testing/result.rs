//! Run result document

use serde::Serialize;

/// Everything recorded during one run, written to `result.yaml`
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub suites: Vec<SuiteResult>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SuiteResult {
    pub name: String,
    pub passed: bool,
    pub steps: Vec<StepResult>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepResult {
    pub name: String,
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(self)
    }
}
