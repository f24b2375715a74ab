// crates/laurel-core/src/ids.rs
//
// Identifier types for stake records.
//
// A token id is whatever the badge contract assigns (usually a decimal
// uint256); an owner id is the wallet address of the staking party. They are
// validated once at the boundary and carried as newtypes from then on.
//
// Token ids end up as a path segment in ownership lookups and as part of
// ledger keys, so they are restricted to `[A-Za-z0-9_-]`. Two spellings of
// one badge would otherwise index as two tokens. Hex wallet addresses are
// lowercased so checksummed and plain forms name the same owner.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LaurelError;

/// Maximum accepted identifier length in bytes.
pub const MAX_ID_LEN: usize = 128;

fn validate(kind: &str, raw: &str) -> Result<String, LaurelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LaurelError::InvalidRequest(format!("{} must not be empty", kind)));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(LaurelError::InvalidRequest(format!(
            "{} exceeds {} bytes",
            kind, MAX_ID_LEN
        )));
    }
    // Keys are joined with ':' in the store, and '\0' separates dedup fields.
    if trimmed.chars().any(|c| c == ':' || c.is_control()) {
        return Err(LaurelError::InvalidRequest(format!(
            "{} contains a reserved character",
            kind
        )));
    }
    Ok(trimmed.to_string())
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// `0x`-prefixed hex addresses compare case-insensitively (EIP-55), so they
/// are stored lowercase. Anything else is kept as given.
fn canonical_owner(id: String) -> String {
    match id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            format!("0x{}", hex.to_ascii_lowercase())
        }
        _ => id,
    }
}

/// Identifier of the staking party (wallet address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Parse and validate an owner id.
    pub fn parse(raw: &str) -> Result<Self, LaurelError> {
        validate("owner id", raw).map(canonical_owner).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a badge token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    /// Parse and validate a token id.
    pub fn parse(raw: &str) -> Result<Self, LaurelError> {
        let id = validate("token id", raw)?;
        if !id.chars().all(is_token_char) {
            return Err(LaurelError::InvalidRequest(format!(
                "token id {:?} may only contain ASCII letters, digits, '-' and '_'",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (owner, token) pair a stake record is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StakeKey {
    pub owner: OwnerId,
    pub token: TokenId,
}

impl StakeKey {
    pub fn new(owner: OwnerId, token: TokenId) -> Self {
        Self { owner, token }
    }

    /// Parse both halves of a key from raw request strings.
    pub fn parse(owner: &str, token: &str) -> Result<Self, LaurelError> {
        Ok(Self {
            owner: OwnerId::parse(owner)?,
            token: TokenId::parse(token)?,
        })
    }
}

impl fmt::Display for StakeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.token)
    }
}
