//! Run orchestration
//!
//! Ties one run together: checks the inputs, loads the spec and plan through
//! the [`SpecStore`] and [`PlanRunner`], runs the selected suites one after
//! another, and writes the result file.

use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::paths::{require_file, require_workspace};
use crate::common::{Error, Result};

use super::runner::{Credentials, PlanRunner};
use super::spec::SpecStore;

/// What to do when the spec or plan fails to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Log the error and carry on with whatever was loaded
    #[default]
    Lenient,
    /// Abort the run
    Strict,
}

/// Everything that identifies one run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub spec_path: PathBuf,
    pub workspace: PathBuf,
    pub plan_path: PathBuf,
    pub credentials: Credentials,
    pub load_policy: LoadPolicy,
}

/// Which suites to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteTarget {
    All,
    Named(String),
}

impl SuiteTarget {
    pub fn parse(target: &str) -> Self {
        if target == "all" {
            Self::All
        } else {
            Self::Named(target.to_string())
        }
    }
}

impl fmt::Display for SuiteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// How one suite went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOutcome {
    pub name: String,
    pub error: Option<String>,
}

impl SuiteOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives a single run over its spec store and plan runner
pub struct Orchestrator<S, P> {
    context: RunContext,
    store: S,
    runner: P,
}

impl<S: SpecStore, P: PlanRunner> Orchestrator<S, P> {
    pub fn new(context: RunContext, store: S, runner: P) -> Self {
        Self {
            context,
            store,
            runner,
        }
    }

    /// Check inputs and load the spec and plan
    ///
    /// Missing inputs are [`Error::Validation`] and nothing should run.
    /// Load errors are only returned under [`LoadPolicy::Strict`].
    pub fn prepare(&mut self) -> Result<()> {
        let ctx = &self.context;
        require_file(&ctx.spec_path, "swagger file")?;
        require_workspace(&ctx.workspace)?;
        require_file(&ctx.plan_path, "test plan file")?;

        if let Err(e) = self.store.load(&ctx.spec_path) {
            tracing::error!(spec = %ctx.spec_path.display(), error = %e, "failed to load spec");
            if ctx.load_policy == LoadPolicy::Strict {
                return Err(e);
            }
        }

        if let Err(e) = self
            .runner
            .load(&ctx.plan_path, &self.store, &ctx.credentials)
        {
            tracing::error!(plan = %ctx.plan_path.display(), error = %e, "failed to load test plan");
            if ctx.load_policy == LoadPolicy::Strict {
                return Err(e);
            }
        }

        Ok(())
    }

    /// Run the selected suites in plan order
    ///
    /// A failing suite never stops the ones after it.
    pub async fn run(&mut self, target: &SuiteTarget) -> Vec<SuiteOutcome> {
        let names = match target {
            SuiteTarget::All => {
                let names = self.runner.suite_names();
                if names.is_empty() {
                    tracing::warn!(plan = %self.context.plan_path.display(), "no test suites loaded");
                }
                names
            }
            SuiteTarget::Named(name) => vec![name.clone()],
        };

        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            tracing::info!(suite = %name, "running test suite");
            println!("\n---\n{} {}", "Test suite:".blue().bold(), name.white().bold());

            let error = match self.runner.run_suite(&name).await {
                Ok(()) => {
                    tracing::info!(suite = %name, "test suite passed");
                    println!("  {} passed", "✓".green());
                    None
                }
                Err(e) => {
                    tracing::warn!(suite = %name, error = %e, "test suite failed");
                    println!("  {} {}", "✗".red(), e);
                    Some(e.to_string())
                }
            };
            outcomes.push(SuiteOutcome { name, error });
        }
        outcomes
    }

    /// Replace whatever is at `result_path` with the current result document
    pub fn finalize(&self, result_path: &Path) -> Result<()> {
        match std::fs::remove_file(result_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::file_write(result_path, e)),
        }

        let document = self.runner.result_document()?;
        std::fs::write(result_path, document).map_err(|e| Error::file_write(result_path, e))?;
        tracing::info!(path = %result_path.display(), "wrote run result");
        Ok(())
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }
}
