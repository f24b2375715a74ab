// crates/laurel-daemon/src/ownership_client.rs
//
// HTTP client for the remote ownership service.
//
// The service answers `GET {endpoint}/tokens/{tokenId}/owner` with
// `{"owner": "<ownerId>"}`, or 404 for a token that does not exist.
// Any other failure means ownership could not be established, and the
// Stake request fails with `OwnershipUnavailable` before touching the ledger.
//
// The token id is pushed as a single encoded path segment, never spliced
// into the URL text. The returned owner is parsed as an `OwnerId`, so hex
// addresses compare case-insensitively.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use laurel_core::error::LaurelError;
use laurel_core::ids::{OwnerId, TokenId};
use laurel_core::traits::OwnershipVerifier;

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    owner: String,
}

/// `OwnershipVerifier` backed by the remote ownership service.
#[derive(Debug, Clone)]
pub struct HttpOwnershipVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpOwnershipVerifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LaurelError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LaurelError::InvalidConfig(format!("ownership client: {}", e)))?;
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| {
            LaurelError::InvalidConfig(format!("ownership endpoint {:?}: {}", endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(LaurelError::InvalidConfig(format!(
                "ownership endpoint {} cannot carry a path",
                endpoint
            )));
        }
        Ok(Self { client, endpoint })
    }

    fn owner_url(&self, token: &TokenId) -> Result<Url, LaurelError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                LaurelError::InvalidConfig(format!("ownership endpoint {} has no path", self.endpoint))
            })?
            .pop_if_empty()
            .push("tokens")
            .push(token.as_str())
            .push("owner");
        Ok(url)
    }
}

#[async_trait]
impl OwnershipVerifier for HttpOwnershipVerifier {
    async fn is_owner(&self, owner: &OwnerId, token: &TokenId) -> Result<bool, LaurelError> {
        let url = self.owner_url(token)?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LaurelError::OwnershipUnavailable(format!("GET {}: {}", url, e)))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("Ownership service has no token {}", token);
            return Ok(false);
        }
        if !resp.status().is_success() {
            return Err(LaurelError::OwnershipUnavailable(format!(
                "GET {} returned {}",
                url,
                resp.status()
            )));
        }

        let body: OwnerResponse = resp.json().await.map_err(|e| {
            LaurelError::OwnershipUnavailable(format!("bad response from {}: {}", url, e))
        })?;
        let current = OwnerId::parse(&body.owner).map_err(|e| {
            LaurelError::OwnershipUnavailable(format!("bad owner from {}: {}", url, e))
        })?;
        Ok(&current == owner)
    }
}
