//! Plan execution
//!
//! Runs the steps of a suite as HTTP requests against the API described by
//! the loaded spec, recording each response in a [`RunResult`].

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::common::{Error, Result};

use super::plan::{TestPlan, TestStep};
use super::result::{RunResult, StepResult, SuiteResult};
use super::spec::SpecStore;

/// Credentials injected into every request of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Bearer token; takes precedence over basic auth
    pub api_token: Option<String>,
}

/// Loads a plan and executes its suites, accumulating results
#[async_trait]
pub trait PlanRunner: Send {
    /// Load the plan at `plan_path`
    ///
    /// On failure the runner is left with no suites.
    fn load(
        &mut self,
        plan_path: &Path,
        spec: &dyn SpecStore,
        credentials: &Credentials,
    ) -> Result<()>;

    /// Names of the loaded suites, in plan order
    fn suite_names(&self) -> Vec<String>;

    /// Run one suite to completion
    ///
    /// Errors report a failed suite; the outcome is recorded either way.
    async fn run_suite(&mut self, name: &str) -> Result<()>;

    /// Serialized result of everything run so far
    fn result_document(&self) -> Result<String>;
}

/// Options for [`HttpPlanRunner`]
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// [`PlanRunner`] that sends each step as an HTTP request
pub struct HttpPlanRunner {
    client: reqwest::Client,
    plan: TestPlan,
    base_url: Option<String>,
    credentials: Credentials,
    result: RunResult,
}

impl HttpPlanRunner {
    pub fn new(options: RunnerOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .user_agent(concat!("mqgo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            plan: TestPlan::default(),
            base_url: None,
            credentials: Credentials::default(),
            result: RunResult::default(),
        })
    }

    pub fn result(&self) -> &RunResult {
        &self.result
    }

    /// Execute one step; never fails, errors end up in the step result
    async fn execute_step(&self, step: &TestStep) -> StepResult {
        let mut result = StepResult {
            name: step.name.clone(),
            method: step.method.to_uppercase(),
            url: step.path.clone(),
            status: None,
            passed: false,
            error: None,
        };

        match self.send(step, &mut result).await {
            Ok(()) => result.passed = true,
            Err(e) => result.error = Some(e.to_string()),
        }
        result
    }

    async fn send(&self, step: &TestStep, result: &mut StepResult) -> Result<()> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            Error::BaseUrl("spec declares no host or servers".to_string())
        })?;
        result.url = step.url(base_url)?;

        let method = reqwest::Method::from_bytes(result.method.as_bytes())
            .map_err(|_| Error::TestAssertion(format!("invalid HTTP method '{}'", step.method)))?;

        let mut request = self
            .client
            .request(method, &result.url)
            .query(&step.query_pairs()?);
        for (name, value) in &step.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &step.body {
            request = request.json(body);
        }
        if let Some(token) = &self.credentials.api_token {
            request = request.bearer_auth(token);
        } else if let Some(username) = &self.credentials.username {
            request = request.basic_auth(username, self.credentials.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        result.status = Some(status);
        tracing::debug!(step = %step.name, url = %result.url, status, "step response");

        if !step.accepts(status) {
            let expected = match step.expect.as_ref().and_then(|e| e.status) {
                Some(status) => status.to_string(),
                None => "2xx".to_string(),
            };
            return Err(Error::TestAssertion(format!(
                "expected status {expected}, got {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PlanRunner for HttpPlanRunner {
    fn load(
        &mut self,
        plan_path: &Path,
        spec: &dyn SpecStore,
        credentials: &Credentials,
    ) -> Result<()> {
        self.base_url = spec.base_url();
        self.credentials = credentials.clone();
        self.result.plan = Some(plan_path.display().to_string());
        self.result.base_url = self.base_url.clone();
        self.plan = TestPlan::default();

        self.plan = TestPlan::from_file(plan_path)?;
        tracing::debug!(
            plan = %plan_path.display(),
            suites = self.plan.suites.len(),
            "loaded test plan"
        );
        Ok(())
    }

    fn suite_names(&self) -> Vec<String> {
        self.plan.suite_names()
    }

    async fn run_suite(&mut self, name: &str) -> Result<()> {
        let suite = self
            .plan
            .suite(name)
            .cloned()
            .ok_or_else(|| Error::SuiteNotFound(name.to_string()))?;

        let mut steps = Vec::with_capacity(suite.steps.len());
        let mut failure = None;
        for step in &suite.steps {
            let step_result = self.execute_step(step).await;
            if !step_result.passed {
                failure = Some(format!(
                    "step '{}': {}",
                    step.name,
                    step_result.error.as_deref().unwrap_or("failed")
                ));
            }
            steps.push(step_result);
            if failure.is_some() {
                break;
            }
        }

        self.result.suites.push(SuiteResult {
            name: suite.name,
            passed: failure.is_none(),
            steps,
        });

        match failure {
            Some(message) => Err(Error::TestAssertion(message)),
            None => Ok(()),
        }
    }

    fn result_document(&self) -> Result<String> {
        Ok(self.result.to_yaml()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FixedSpec(Option<String>);

    impl SpecStore for FixedSpec {
        fn load(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn base_url(&self) -> Option<String> {
            self.0.clone()
        }
    }

    fn runner_with_plan(plan: &str, base_url: Option<&str>) -> HttpPlanRunner {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        std::fs::write(&path, plan).unwrap();

        let mut runner = HttpPlanRunner::new(RunnerOptions::default()).unwrap();
        runner
            .load(
                &path,
                &FixedSpec(base_url.map(str::to_string)),
                &Credentials::default(),
            )
            .unwrap();
        runner
    }

    #[test]
    fn test_load_lists_suites_in_order() {
        let runner = runner_with_plan("b: []\na: []\n---\nc: []\n", Some("http://x"));
        assert_eq!(runner.suite_names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_failed_load_leaves_no_suites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        std::fs::write(&path, "- not: a plan\n").unwrap();

        let mut runner = HttpPlanRunner::new(RunnerOptions::default()).unwrap();
        let err = runner
            .load(&path, &FixedSpec(None), &Credentials::default())
            .unwrap_err();
        assert!(matches!(err, Error::PlanLoad { .. }));
        assert!(runner.suite_names().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_suite() {
        let mut runner = runner_with_plan("a: []\n", Some("http://x"));
        let err = runner.run_suite("missing").await.unwrap_err();
        assert!(matches!(err, Error::SuiteNotFound(name) if name == "missing"));
        assert!(runner.result().suites.is_empty());
    }

    #[tokio::test]
    async fn test_missing_base_url_fails_the_suite() {
        let mut runner = runner_with_plan(
            "a:\n  - name: first\n    path: /x\n  - name: second\n    path: /y\n",
            None,
        );

        let err = runner.run_suite("a").await.unwrap_err();
        assert!(err.to_string().contains("step 'first'"));

        let suite = &runner.result().suites[0];
        assert!(!suite.passed);
        assert_eq!(suite.steps.len(), 1);
        let error = suite.steps[0].error.as_deref().unwrap();
        assert!(error.starts_with("No base URL to send requests to"));
        assert!(error.contains("no host"));
    }

    #[tokio::test]
    async fn test_empty_suite_passes_and_is_recorded() {
        let mut runner = runner_with_plan("a: []\n", Some("http://x"));
        runner.run_suite("a").await.unwrap();

        let doc = runner.result_document().unwrap();
        assert!(doc.contains("name: a"));
        assert!(doc.contains("passed: true"));
        assert!(doc.contains("base_url: http://x"));
    }
}
