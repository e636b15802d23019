//! Test plan execution
//!
//! The [`Orchestrator`] owns one run: it loads the annotated spec through a
//! [`SpecStore`], hands the plan to a [`PlanRunner`], runs the selected suites
//! sequentially and writes the result document.

mod orchestrator;
mod plan;
mod result;
mod runner;
mod spec;

pub use orchestrator::{LoadPolicy, Orchestrator, RunContext, SuiteOutcome, SuiteTarget};
pub use plan::{StepExpectation, TestPlan, TestStep, TestSuite};
pub use result::{RunResult, StepResult, SuiteResult};
pub use runner::{Credentials, HttpPlanRunner, PlanRunner, RunnerOptions};
pub use spec::{SpecStore, SwaggerStore};
