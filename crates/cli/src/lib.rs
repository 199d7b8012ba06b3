pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "kiosk",
    about = "Kiosk order-taking operator CLI",
    long_about = "Dry-run the slot engine on an utterance, apply migrations, and inspect configuration.",
    after_help = "Examples:\n  kiosk parse \"30cm 슈림프 빵 허니오트 치즈 아메리칸\"\n  kiosk parse --json \"렌치만\"\n  kiosk migrate\n  kiosk config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve one utterance with the rule-based slot engine")]
    Parse {
        #[arg(help = "Utterance to parse")]
        text: String,
        #[arg(long, help = "Print the slot result instead of a command outcome")]
        json: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Parse { text, json } => commands::parse::run(&text, json),
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
