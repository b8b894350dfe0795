use clap::Parser;
use clickspeak_cli::{doctor, EXIT_FAILURE};
use clickspeak_host::{AppProfile, HostContext};
use std::process::ExitCode;

/// Check the ClickSpeak runtime installation without starting the application.
#[derive(Debug, Parser)]
#[command(name = "clickspeak-doctor", version)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also print the environment, search path and identities a launch would use.
    #[arg(long, default_value_t = false)]
    plan: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    clickspeak_cli::init_tracing(if cli.verbose { "debug" } else { "warn" });

    let profile = AppProfile::clickspeak();
    let ctx = HostContext::capture(&profile);
    match doctor::run(&profile, &ctx, cli.json, cli.plan) {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
