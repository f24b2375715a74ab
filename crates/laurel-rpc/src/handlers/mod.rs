// crates/laurel-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for a specific API group.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use laurel_core::error::LaurelError;

pub mod node;
pub mod staking;

/// Error returned by every handler: the taxonomy kind plus a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct RpcError {
    /// One of the `LaurelError` kind names.
    pub kind: String,
    pub message: String,
}

impl RpcError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: "InvalidRequest".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: "Serialization".to_string(),
            message: message.into(),
        }
    }
}

impl From<LaurelError> for RpcError {
    fn from(e: LaurelError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}
