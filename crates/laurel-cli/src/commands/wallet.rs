// crates/laurel-cli/src/commands/wallet.rs
//
// `laurel wallet {connect, disconnect, show}` — wallet session lifecycle.

use clap::Subcommand;

use crate::session::{self, Session};

/// Wallet session subcommands.
#[derive(Debug, Subcommand)]
pub enum WalletCmd {
    /// Connect a wallet address for subsequent commands.
    Connect {
        /// Wallet address.
        address: String,
    },
    /// Forget the connected wallet.
    Disconnect,
    /// Show the connected wallet.
    Show,
}

/// Run the wallet subcommand.
pub async fn run(cmd: &WalletCmd) -> Result<(), Box<dyn std::error::Error>> {
    let path = session::default_path()?;
    match cmd {
        WalletCmd::Connect { address } => {
            let session = Session::connect(address)?;
            session::save(&path, &session)?;
            println!("Connected wallet {}", session.owner_id);
            println!("  Session: {}", session.session_id);
            println!("  Saved to: {}", path.display());
        }
        WalletCmd::Disconnect => match session::clear(&path)? {
            Some(previous) => println!("Disconnected wallet {}", previous.owner_id),
            None => println!("No wallet connected."),
        },
        WalletCmd::Show => match session::load(&path)? {
            Some(session) => {
                println!("Connected wallet: {}", session.owner_id);
                println!("  Session:      {}", session.session_id);
                println!("  Connected at: {}", session.connected_at);
            }
            None => println!("No wallet connected. Run `laurel wallet connect <address>` first."),
        },
    }

    Ok(())
}
