pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "olivia",
    about = "OLIVIA operator CLI",
    long_about = "Inspect OLIVIA readiness and configuration, and try the assistant from a terminal.",
    after_help = "Examples:\n  olivia doctor --json\n  olivia config\n  olivia ask \"¿cuántos días de vacaciones tengo?\"\n  olivia slug \"Portal RRHH\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Check config, completion credentials, policy files, and the access map")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Send one message through the assistant and print the reply")]
    Ask {
        #[arg(help = "Message text, as a user would type it in the chat widget")]
        text: String,
        #[arg(long, help = "Session id used for menu flows")]
        session: Option<String>,
        #[arg(long, help = "Print the structured reply as JSON")]
        json: bool,
    },
    #[command(about = "Print the redirect slug derived from an access label")]
    Slug {
        #[arg(help = "Access label, e.g. \"Portal RRHH\"")]
        label: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Ask { text, session, json } => commands::ask::run(&text, session.as_deref(), json),
        Command::Slug { label } => commands::slug::run(&label),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
