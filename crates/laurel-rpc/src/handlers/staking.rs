// crates/laurel-rpc/src/handlers/staking.rs
//
// Staking handlers: Stake, Unstake, Claim, PendingPoints, Settle, and the
// read-side queries (IsStaked, StakedTokens, OwnerSummary, Receipt).

use serde::{Deserialize, Serialize};

use laurel_core::ids::{OwnerId, TokenId};
use laurel_core::receipt::SettlementReceipt;
use laurel_staking::{
    ClaimOutcome, ClaimRequest, OwnerSummary, PendingPoints, PendingPointsRequest, SettleRequest,
    SettlementResult, StakeOutcome, StakeRequest, StakingService, UnstakeOutcome, UnstakeRequest,
};

use super::RpcError;

// ---------------------------------------------------------------------------
// Stake / Unstake / Claim
// ---------------------------------------------------------------------------

/// Handle a Stake request.
///
/// Ownership is checked with the verifier before anything is written.
pub async fn handle_stake(
    service: &StakingService,
    request: StakeRequest,
) -> Result<StakeOutcome, RpcError> {
    let key = request.key()?;
    Ok(service.stake(&key).await?)
}

/// Handle an Unstake request. Settles outstanding accrual first.
pub async fn handle_unstake(
    service: &StakingService,
    request: UnstakeRequest,
) -> Result<UnstakeOutcome, RpcError> {
    let key = request.key()?;
    Ok(service.unstake(&key).await?)
}

/// Handle a ClaimPoints request.
pub async fn handle_claim(
    service: &StakingService,
    request: ClaimRequest,
) -> Result<ClaimOutcome, RpcError> {
    let key = request.key()?;
    Ok(service.claim(&key).await?)
}

/// Handle a GetPendingPoints request. Read-only.
pub async fn handle_pending_points(
    service: &StakingService,
    request: PendingPointsRequest,
) -> Result<PendingPoints, RpcError> {
    let key = request.key()?;
    Ok(service.pending_points(&key).await?)
}

/// Handle a Settle request (explicit settlement instant).
pub async fn handle_settle(
    service: &StakingService,
    request: SettleRequest,
) -> Result<SettlementResult, RpcError> {
    let key = request.key()?;
    Ok(service.settle(&key, request.as_of).await?)
}

// ---------------------------------------------------------------------------
// IsStaked
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsStakedRequest {
    pub token_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsStakedResponse {
    pub token_id: String,
    pub staked: bool,
    /// The owner holding the stake, when staked.
    pub staker: Option<String>,
}

pub async fn handle_is_staked(
    service: &StakingService,
    request: IsStakedRequest,
) -> Result<IsStakedResponse, RpcError> {
    let token = TokenId::parse(&request.token_id)?;
    let staker = service.staker_of(&token).await?;
    Ok(IsStakedResponse {
        token_id: token.to_string(),
        staked: staker.is_some(),
        staker: staker.map(|o| o.to_string()),
    })
}

// ---------------------------------------------------------------------------
// StakedTokens / OwnerSummary
// ---------------------------------------------------------------------------

/// Request naming a single owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRequest {
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakedTokensResponse {
    pub owner_id: String,
    pub token_ids: Vec<String>,
}

pub async fn handle_staked_tokens(
    service: &StakingService,
    request: OwnerRequest,
) -> Result<StakedTokensResponse, RpcError> {
    let owner = OwnerId::parse(&request.owner_id)?;
    let tokens = service.staked_tokens(&owner).await?;
    Ok(StakedTokensResponse {
        owner_id: owner.to_string(),
        token_ids: tokens.into_iter().map(|t| t.to_string()).collect(),
    })
}

pub async fn handle_owner_summary(
    service: &StakingService,
    request: OwnerRequest,
) -> Result<OwnerSummary, RpcError> {
    let owner = OwnerId::parse(&request.owner_id)?;
    Ok(service.owner_summary(&owner).await?)
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub dedup_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub receipt: Option<SettlementReceipt>,
}

pub async fn handle_receipt(
    service: &StakingService,
    request: ReceiptRequest,
) -> Result<ReceiptResponse, RpcError> {
    let dedup_key = request.dedup_key.trim();
    if dedup_key.len() != 64 || !dedup_key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RpcError::invalid_request(
            "dedupKey must be 64 hex characters",
        ));
    }
    Ok(ReceiptResponse {
        receipt: service.receipt(dedup_key).await?,
    })
}
