// crates/laurel-rpc/src/handlers/node.rs
//
// Node info and health handlers: GetNodeInfo, GetHealth.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use laurel_core::ids::TokenId;
use laurel_staking::StakingService;

use super::RpcError;

// ---------------------------------------------------------------------------
// GetNodeInfo
// ---------------------------------------------------------------------------

/// Request for node information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodeInfoRequest {}

/// Response containing node information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodeInfoResponse {
    /// Software version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Ledger backend in use ("rocks" or "memory").
    pub store_backend: String,
    /// Points accrued per full day staked.
    pub rate_per_day: u64,
    /// Length of a day in seconds.
    pub one_day_secs: u64,
    /// The engine clock, RFC 3339.
    pub server_time: String,
}

/// Handle a GetNodeInfo request.
pub async fn handle_get_node_info(
    _request: GetNodeInfoRequest,
    service: &StakingService,
    store_backend: &str,
    start_time: Option<Instant>,
) -> Result<GetNodeInfoResponse, RpcError> {
    let config = service.config();
    Ok(GetNodeInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0),
        store_backend: store_backend.to_string(),
        rate_per_day: config.rate_per_day,
        one_day_secs: config.one_day_secs,
        server_time: service.now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// GetHealth
// ---------------------------------------------------------------------------

/// Request for node health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthRequest {}

/// Response containing node health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthResponse {
    /// Overall health: "healthy" or "unhealthy".
    pub status: String,
    /// Whether the ledger store answered a health-check read.
    pub storage_ok: bool,
    /// Human-readable details.
    pub details: Option<String>,
}

/// Handle a GetHealth request.
///
/// Probes the ledger with a token index read.
pub async fn handle_get_health(
    _request: GetHealthRequest,
    service: &StakingService,
) -> Result<GetHealthResponse, RpcError> {
    let sentinel = TokenId::parse("0")?;
    let (status, storage_ok, details) = match service.staker_of(&sentinel).await {
        Ok(_) => ("healthy", true, None),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ("unhealthy", false, Some(e.to_string()))
        }
    };

    Ok(GetHealthResponse {
        status: status.to_string(),
        storage_ok,
        details,
    })
}
