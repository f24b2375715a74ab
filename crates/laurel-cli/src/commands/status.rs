// crates/laurel-cli/src/commands/status.rs
//
// `laurel status` — daemon reachability, accrual settings, and wallet session.

use serde_json::json;

use laurel_rpc::handlers::node::{GetHealthResponse, GetNodeInfoResponse};

use crate::rpc_client::rpc_result;
use crate::session;

/// Run the status command.
pub async fn run(rpc: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Laurel v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Node Status");
    println!("-----------");
    println!("  RPC endpoint: {}", rpc);

    match rpc_result::<GetNodeInfoResponse>(rpc, "node/info", json!({})).await {
        Ok(info) => {
            println!("  Connection:   Connected");
            println!("  Version:      {}", info.version);
            println!("  Uptime:       {}s", info.uptime_seconds);
            println!("  Ledger:       {}", info.store_backend);
            println!(
                "  Accrual:      {} points per {}s",
                info.rate_per_day, info.one_day_secs
            );
            println!("  Server time:  {}", info.server_time);
        }
        Err(e) => println!("  Connection:   Not connected ({})", e),
    }

    if let Ok(health) = rpc_result::<GetHealthResponse>(rpc, "node/health", json!({})).await {
        println!("  Health:       {}", health.status);
        if let Some(details) = health.details {
            println!("  Details:      {}", details);
        }
    }

    println!();
    match session::load(&session::default_path()?)? {
        Some(s) => println!("Wallet: {}", s.owner_id),
        None => println!("Wallet: not connected"),
    }

    Ok(())
}
