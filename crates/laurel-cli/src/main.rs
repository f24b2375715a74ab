// crates/laurel-cli/src/main.rs
//
// CLI entrypoint for the Laurel developer tools.
//
// Provides subcommands for connecting a wallet session, staking and
// unstaking badge tokens, claiming points, and checking daemon status.

mod commands;
mod output;
mod rpc_client;
mod session;

use clap::{Parser, Subcommand};
use commands::stake::StakeCmd;
use commands::wallet::WalletCmd;
use output::OutputFormat;

/// Laurel CLI — stake badge tokens and earn points.
#[derive(Parser, Debug)]
#[command(name = "laurel", version, about = "Laurel badge staking CLI")]
struct Cli {
    /// RPC endpoint for the laurel-daemon.
    #[arg(long, global = true, default_value = "http://localhost:50071")]
    rpc: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Wallet session: connect, disconnect, show.
    #[command(subcommand)]
    Wallet(WalletCmd),

    /// Staking: stake, unstake, claim, pending, list, summary.
    #[command(subcommand)]
    Stake(StakeCmd),

    /// Display daemon connection status and accrual settings.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        Commands::Wallet(cmd) => commands::wallet::run(cmd).await?,
        Commands::Stake(cmd) => commands::stake::run(cmd, &cli.rpc, format).await?,
        Commands::Status => commands::status::run(&cli.rpc).await?,
    }

    Ok(())
}
