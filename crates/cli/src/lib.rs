pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tiendanube",
    about = "Tienda Nube MCP operator CLI",
    long_about = "Inspect configuration, check store connectivity, and list the MCP tool surface.",
    after_help = "Examples:\n  tiendanube doctor --json\n  tiendanube config\n  tiendanube tools"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, store credentials, and Tienda Nube API reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List every MCP tool grouped by category")]
    Tools {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Tools { json } => commands::tools::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
