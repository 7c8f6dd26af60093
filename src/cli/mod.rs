use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing_subscriber;

use crate::errors::AppResult;

pub mod commands;

/// Ark Protocol Construct Inspector
#[derive(Parser)]
#[command(name = "ark-inspect")]
#[command(about = "Decode Ark addresses, tapscript closures, taptrees and PSBTs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Decode a bech32m-encoded Ark address
    Address(commands::address::AddressCommand),
    /// Disassemble a tapscript and classify its spending closure
    Script(commands::script::ScriptCommand),
    /// Decode or encode VTXO taptree blobs
    Taptree(commands::taptree::TaptreeCommand),
    /// Decode a PSBT and its Ark proprietary fields
    Psbt(commands::psbt::PsbtCommand),
}

pub fn run() -> AppResult<()> {
    // Initialise tracing subscriber to capture debug!() macros
    // Uses RUST_LOG environment variable (defaults to "error" if not set)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = parse_args();

    match cli.command {
        Commands::Address(command) => command.run(),
        Commands::Script(command) => command.run(),
        Commands::Taptree(command) => command.run(),
        Commands::Psbt(command) => command.run(),
    }
}

/// Argument parsing with the published exit codes: usage errors exit 1,
/// `--help` and `--version` exit 0.
fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}
