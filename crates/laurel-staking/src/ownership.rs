// crates/laurel-staking/src/ownership.rs
//
// Static ownership registry: a process-local `OwnershipVerifier`.
//
// Backs development deployments (seeded from the daemon config's
// `[ownership.dev_owners]` table) and tests. Production deployments point
// the daemon at a remote ownership endpoint instead.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use laurel_core::error::LaurelError;
use laurel_core::ids::{OwnerId, TokenId};
use laurel_core::traits::OwnershipVerifier;

/// Token-to-owner map answering ownership queries from memory.
#[derive(Debug, Default)]
pub struct StaticOwnershipRegistry {
    owners: RwLock<HashMap<TokenId, OwnerId>>,
}

impl StaticOwnershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from raw `token -> owner` pairs.
    ///
    /// # Errors
    /// `InvalidConfig` if any identifier is malformed.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, LaurelError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let registry = Self::new();
        for (token, owner) in pairs {
            let token = TokenId::parse(token)
                .map_err(|e| LaurelError::InvalidConfig(format!("dev owner token: {}", e)))?;
            let owner = OwnerId::parse(owner)
                .map_err(|e| LaurelError::InvalidConfig(format!("dev owner for {}: {}", token, e)))?;
            registry.assign(token, owner)?;
        }
        Ok(registry)
    }

    /// Record `owner` as the owner of `token`, replacing any previous owner.
    pub fn assign(&self, token: TokenId, owner: OwnerId) -> Result<(), LaurelError> {
        self.owners
            .write()
            .map_err(|_| LaurelError::OwnershipUnavailable("registry lock poisoned".to_string()))?
            .insert(token, owner);
        Ok(())
    }

    /// Forget the owner of `token`.
    pub fn revoke(&self, token: &TokenId) -> Result<Option<OwnerId>, LaurelError> {
        Ok(self
            .owners
            .write()
            .map_err(|_| LaurelError::OwnershipUnavailable("registry lock poisoned".to_string()))?
            .remove(token))
    }

    pub fn len(&self) -> usize {
        self.owners.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OwnershipVerifier for StaticOwnershipRegistry {
    async fn is_owner(&self, owner: &OwnerId, token: &TokenId) -> Result<bool, LaurelError> {
        let owners = self
            .owners
            .read()
            .map_err(|_| LaurelError::OwnershipUnavailable("registry lock poisoned".to_string()))?;
        Ok(owners.get(token) == Some(owner))
    }
}
