// crates/laurel-cli/src/commands/stake.rs
//
// `laurel stake {stake, unstake, claim, pending, list, summary}` — badge
// staking commands.

use clap::Subcommand;
use serde_json::json;
use tabled::Tabled;

use laurel_core::time::Timestamp;
use laurel_staking::{
    ClaimOutcome, OwnerSummary, PendingPoints, StakeOutcome, UnstakeOutcome,
};

use crate::output::{format_json, format_table, OutputFormat};
use crate::rpc_client::rpc_result;
use crate::session::resolve_owner;

/// Staking subcommands. The owner defaults to the connected wallet.
#[derive(Debug, Subcommand)]
pub enum StakeCmd {
    /// Stake a badge token. Earns 3 points daily by default.
    Stake {
        /// Badge token id.
        token: String,
        /// Owner wallet address (defaults to the connected wallet).
        #[arg(long)]
        owner: Option<String>,
    },
    /// Unstake a badge token, settling outstanding points.
    Unstake {
        token: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Claim accrued points without unstaking.
    Claim {
        token: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show points that a claim would award now.
    Pending {
        token: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// List the tokens an owner has staked.
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show every stake record for an owner with balances.
    Summary {
        #[arg(long)]
        owner: Option<String>,
    },
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StakedTokens {
    owner_id: String,
    token_ids: Vec<String>,
}

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Staked Since")]
    staked_at: String,
    #[tabled(rename = "Balance")]
    balance: u64,
    #[tabled(rename = "Pending")]
    pending: u64,
}

/// Run the stake subcommand.
pub async fn run(
    cmd: &StakeCmd,
    rpc: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        StakeCmd::Stake { token, owner } => {
            let owner = resolve_owner(owner.as_deref())?;
            let out: StakeOutcome =
                rpc_result(rpc, "staking/stake", pair(&owner, token)).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&out)),
                OutputFormat::Table => {
                    println!("Staked token {} for {}", token, owner);
                    println!("  Status:     {}", out.status);
                    println!("  Staked at:  {}", out.staked_at.to_rfc3339());
                }
            }
        }
        StakeCmd::Unstake { token, owner } => {
            let owner = resolve_owner(owner.as_deref())?;
            let out: UnstakeOutcome =
                rpc_result(rpc, "staking/unstake", pair(&owner, token)).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&out)),
                OutputFormat::Table => {
                    println!("Unstaked token {} for {}", token, owner);
                    println!("  Points awarded: {}", out.points_awarded);
                    println!("  New balance:    {}", out.new_balance);
                }
            }
        }
        StakeCmd::Claim { token, owner } => {
            let owner = resolve_owner(owner.as_deref())?;
            let out: ClaimOutcome = rpc_result(rpc, "staking/claim", pair(&owner, token)).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&out)),
                OutputFormat::Table => {
                    println!("Claimed {} points on token {}", out.points_awarded, token);
                    println!("  New balance: {}", out.new_balance);
                }
            }
        }
        StakeCmd::Pending { token, owner } => {
            let owner = resolve_owner(owner.as_deref())?;
            let out: PendingPoints =
                rpc_result(rpc, "staking/pending", pair(&owner, token)).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&out)),
                OutputFormat::Table => println!("Pending points: {}", out.pending_points),
            }
        }
        StakeCmd::List { owner } => {
            let owner = resolve_owner(owner.as_deref())?;
            let out: StakedTokens =
                rpc_result(rpc, "staking/tokens", json!({ "ownerId": owner })).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&out)),
                OutputFormat::Table if out.token_ids.is_empty() => {
                    println!("No tokens staked by {}", out.owner_id);
                }
                OutputFormat::Table => {
                    println!("Tokens staked by {}:", out.owner_id);
                    for token in &out.token_ids {
                        println!("  {}", token);
                    }
                }
            }
        }
        StakeCmd::Summary { owner } => {
            let owner = resolve_owner(owner.as_deref())?;
            let out: OwnerSummary =
                rpc_result(rpc, "staking/summary", json!({ "ownerId": owner })).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&out)),
                OutputFormat::Table => print_summary(&out),
            }
        }
    }

    Ok(())
}

fn pair(owner: &str, token: &str) -> serde_json::Value {
    json!({ "ownerId": owner, "tokenId": token })
}

fn print_summary(summary: &OwnerSummary) {
    let rows: Vec<PositionRow> = summary
        .positions
        .iter()
        .map(|p| PositionRow {
            token: p.record.token.to_string(),
            status: p.record.status.to_string(),
            staked_at: p
                .record
                .staked_at
                .map(|t: Timestamp| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            balance: p.record.accrued_points_balance,
            pending: p.pending_points,
        })
        .collect();

    println!("Owner: {}", summary.owner_id);
    if rows.is_empty() {
        println!("No stake records.");
        return;
    }
    println!("{}", format_table(&rows));
    println!(
        "Staked: {}   Total balance: {}   Total pending: {}",
        summary.staked_count, summary.total_balance, summary.total_pending
    );
}
