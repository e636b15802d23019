//! mqgo - generate API test plans from a Swagger spec and run them
//!
//! `mqgo generate` asks the generation service for test plans,
//! `mqgo run -p <plan>` executes them against the API.

use clap::Parser;
use mqgo::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "mqgo", about = "Generate and run API test plans")]
#[command(version, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures; everything else is usage error 1
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("got an err:\n{e}");
        std::process::exit(1);
    }
}
