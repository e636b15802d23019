//! CLI command definitions
//!
//! Defines the clap commands for mqgo.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::paths::DEFAULT_WORKSPACE;
use crate::generate::DEFAULT_SERVER_URL;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate test plans to be used by the run command
    Generate {
        /// The directory where mqgo keeps its config, generated files and logs
        #[arg(short = 'd', long = "dir", default_value = DEFAULT_WORKSPACE)]
        workspace: PathBuf,

        /// The swagger file to generate plans for [default: <dir>/swagger.yaml]
        #[arg(short = 's', long = "swagger")]
        swagger: Option<PathBuf>,

        /// Base URL of the generation service
        #[arg(long, env = "MQGO_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
        server: String,
    },

    /// Run the tests in a test plan file
    Run {
        /// The directory where mqgo keeps its config, generated files and logs
        #[arg(short = 'd', long = "dir", default_value = DEFAULT_WORKSPACE)]
        workspace: PathBuf,

        /// The annotated swagger file [default: <dir>/swagger_meqa.yaml]
        #[arg(short = 's', long = "swagger")]
        swagger: Option<PathBuf>,

        /// The test plan file
        #[arg(short = 'p', long = "plan")]
        plan: Option<PathBuf>,

        /// The test result file [default: <dir>/result.yaml]
        #[arg(short = 'r', long = "result")]
        result: Option<PathBuf>,

        /// The test suite to run, or "all"
        #[arg(short = 't', long = "test", default_value = "all")]
        test: String,

        /// The username for basic HTTP authentication
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// The password for basic HTTP authentication
        #[arg(short = 'w', long)]
        password: Option<String>,

        /// The api token for bearer HTTP authentication
        #[arg(short = 'a', long = "api-token")]
        api_token: Option<String>,

        /// Turn on verbose logging
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Abort when the spec or the test plan fails to load
        #[arg(long)]
        strict: bool,
    },
}
