// crates/laurel-staking/src/commands.rs
//
// Typed request/response pairs for the staking operations.
//
// Each operation has its own request type, validated into a `StakeKey` at the
// boundary, and its own response type carrying a consistent state snapshot.

use serde::{Deserialize, Serialize};

use laurel_core::error::LaurelError;
use laurel_core::ids::StakeKey;
use laurel_core::record::{StakeRecord, StakeStatus};
use laurel_core::time::Timestamp;

/// Declares a request type naming one (owner, token) pair.
///
/// Every pair operation gets its own struct so a claim request cannot be
/// passed where a stake request is expected, while the wire shape
/// (`{ownerId, tokenId}`) stays the same for all of them.
macro_rules! pair_request {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub owner_id: String,
            pub token_id: String,
        }

        impl $name {
            pub fn new(owner_id: impl Into<String>, token_id: impl Into<String>) -> Self {
                Self {
                    owner_id: owner_id.into(),
                    token_id: token_id.into(),
                }
            }

            /// Validate the identifiers.
            ///
            /// # Errors
            /// `InvalidRequest` for empty, oversized, or malformed identifiers.
            pub fn key(&self) -> Result<StakeKey, LaurelError> {
                StakeKey::parse(&self.owner_id, &self.token_id)
            }
        }
    };
}

pair_request!(
    /// Stake a token the owner holds.
    StakeRequest
);
pair_request!(
    /// Unstake a token, settling what has accrued.
    UnstakeRequest
);
pair_request!(
    /// Claim accrued points without unstaking.
    ClaimRequest
);
pair_request!(
    /// Read the points a claim would award now.
    PendingPointsRequest
);

/// Request to settle a pair up to an explicit instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub owner_id: String,
    pub token_id: String,
    /// Defaults to now. Instants in the future are clamped to now.
    #[serde(default)]
    pub as_of: Option<Timestamp>,
}

impl SettleRequest {
    pub fn key(&self) -> Result<StakeKey, LaurelError> {
        StakeKey::parse(&self.owner_id, &self.token_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeOutcome {
    pub status: StakeStatus,
    pub staked_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstakeOutcome {
    pub status: StakeStatus,
    pub points_awarded: u64,
    pub new_balance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub points_awarded: u64,
    pub new_balance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPoints {
    pub pending_points: u64,
}

/// One record in an owner summary, with its live pending amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakePosition {
    pub record: StakeRecord,
    pub pending_points: u64,
}

/// Everything the ledger holds for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub owner_id: String,
    pub positions: Vec<StakePosition>,
    pub staked_count: usize,
    pub total_balance: u64,
    pub total_pending: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_camel_case() {
        let req: StakeRequest =
            serde_json::from_str(r#"{"ownerId":"0xabc","tokenId":"12"}"#).unwrap();
        assert_eq!(req, StakeRequest::new("0xabc", "12"));
        assert_eq!(req.key().unwrap().to_string(), "0xabc/12");
    }

    #[test]
    fn test_pair_requests_share_wire_shape() {
        let json = r#"{"ownerId":"0xabc","tokenId":"12"}"#;
        let unstake: UnstakeRequest = serde_json::from_str(json).unwrap();
        let claim: ClaimRequest = serde_json::from_str(json).unwrap();
        let pending: PendingPointsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(unstake.key().unwrap(), claim.key().unwrap());
        assert_eq!(claim.key().unwrap(), pending.key().unwrap());
        assert_eq!(
            serde_json::to_string(&claim).unwrap(),
            serde_json::to_string(&ClaimRequest::new("0xabc", "12")).unwrap()
        );
    }

    #[test]
    fn test_pair_requests_are_distinct_types() {
        fn type_name<T>(_: &T) -> &'static str {
            std::any::type_name::<T>()
        }
        let stake = StakeRequest::new("0xabc", "12");
        let claim = ClaimRequest::new("0xabc", "12");
        assert_ne!(type_name(&stake), type_name(&claim));
    }

    #[test]
    fn test_request_rejects_empty_token() {
        let req = ClaimRequest::new("0xabc", "  ");
        assert!(matches!(req.key(), Err(LaurelError::InvalidRequest(_))));
    }

    #[test]
    fn test_settle_request_as_of_optional() {
        let req: SettleRequest =
            serde_json::from_str(r#"{"ownerId":"0xabc","tokenId":"12"}"#).unwrap();
        assert_eq!(req.as_of, None);
    }

    #[test]
    fn test_outcome_shape() {
        let out = UnstakeOutcome {
            status: StakeStatus::Unstaked,
            points_awarded: 3,
            new_balance: 7,
        };
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["status"], "Unstaked");
        assert_eq!(value["pointsAwarded"], 3);
        assert_eq!(value["newBalance"], 7);
    }
}
