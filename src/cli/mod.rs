//! CLI command handling
//!
//! Sets up logging for the workspace, wires the real collaborators into
//! `generate` and the run orchestrator, and decides which failures are
//! reported softly (bad inputs) and which end the process with an error.

use colored::Colorize;
use std::path::Path;

use crate::commands::Commands;
use crate::common::paths::{
    require_file, require_workspace, ANNOTATED_SPEC_FILE, RESULT_FILE, SOURCE_SPEC_FILE,
};
use crate::common::{logging, Error, Result};
use crate::generate::{self, HttpGenerationService};
use crate::testing::{
    Credentials, HttpPlanRunner, LoadPolicy, Orchestrator, RunContext, RunnerOptions,
    SuiteTarget, SwaggerStore,
};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            workspace,
            swagger,
            server,
        } => {
            let swagger = swagger.unwrap_or_else(|| workspace.join(SOURCE_SPEC_FILE));
            let _guard = logging::init(&workspace, false);
            log_invocation();

            if let Err(e) = require_file(&swagger, "swagger file")
                .and_then(|()| require_workspace(&workspace))
            {
                return soft_failure(e);
            }

            let service = HttpGenerationService::new(&server)?;
            tracing::info!(endpoint = %service.endpoint(), spec = %swagger.display(), "generating test plans");
            let summary = generate::generate(&workspace, &swagger, &service).await?;

            println!(
                "{} {}",
                "Annotated spec:".cyan(),
                summary.annotated_spec.display()
            );
            if summary.plans.is_empty() {
                println!("No test plans were generated");
            }
            for plan in &summary.plans {
                println!("{} {}", "Test plan:".cyan(), plan.display());
            }
            Ok(())
        }

        Commands::Run {
            workspace,
            swagger,
            plan,
            result,
            test,
            username,
            password,
            api_token,
            verbose,
            strict,
        } => {
            let _guard = logging::init(&workspace, verbose);
            log_invocation();

            let spec_path = swagger.unwrap_or_else(|| workspace.join(ANNOTATED_SPEC_FILE));
            if let Err(e) = require_file(&spec_path, "swagger file")
                .and_then(|()| require_workspace(&workspace))
            {
                return soft_failure(e);
            }

            let Some(plan) = plan else {
                println!("You must use -p to specify a test plan file. Use -h to see more options.");
                return Ok(());
            };

            let context = RunContext {
                spec_path,
                plan_path: plan,
                credentials: Credentials {
                    username: non_empty(username),
                    password: non_empty(password),
                    api_token: non_empty(api_token),
                },
                load_policy: if strict {
                    LoadPolicy::Strict
                } else {
                    LoadPolicy::Lenient
                },
                workspace,
            };
            let result_path = result.unwrap_or_else(|| context.workspace.join(RESULT_FILE));

            run_plan(context, &SuiteTarget::parse(&test), &result_path).await
        }
    }
}

async fn run_plan(context: RunContext, target: &SuiteTarget, result_path: &Path) -> Result<()> {
    let runner = HttpPlanRunner::new(RunnerOptions::default())?;
    let mut orchestrator = Orchestrator::new(context, SwaggerStore::new(), runner);

    if let Err(e) = orchestrator.prepare() {
        if e.is_validation() {
            return soft_failure(e);
        }
        return Err(e);
    }

    tracing::info!(suites = %target, "starting run");
    let outcomes = orchestrator.run(target).await;
    orchestrator.finalize(result_path)?;

    let failed = outcomes.iter().filter(|o| !o.passed()).count();
    println!(
        "\n{} {} passed, {} failed. Results written to {}",
        "Summary:".blue().bold(),
        outcomes.len() - failed,
        failed,
        result_path.display()
    );
    Ok(())
}

/// Report an input problem without failing the process
fn soft_failure(e: Error) -> Result<()> {
    tracing::info!(error = %e, "invalid input");
    println!("{e}");
    Ok(())
}

fn log_invocation() {
    let args: Vec<String> = std::env::args().collect();
    tracing::info!(?args, "mqgo invoked");
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
