// crates/laurel-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the laurel-daemon HTTP endpoint.

use laurel_rpc::{JsonRpcRequest, JsonRpcResponse};

/// Route of the daemon's single JSON-RPC service.
pub const RPC_PATH: &str = "/laurel.rpc.StakingService/Call";

/// Full URL of the JSON-RPC route for a daemon endpoint.
pub fn rpc_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), RPC_PATH)
}

/// Send a JSON-RPC call to the daemon and return the parsed response.
pub async fn rpc_call(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<JsonRpcResponse, Box<dyn std::error::Error>> {
    let request = JsonRpcRequest {
        method: method.to_string(),
        params,
    };

    let client = reqwest::Client::new();
    let resp = client
        .post(rpc_url(endpoint))
        .json(&request)
        .send()
        .await?;

    let rpc_response: JsonRpcResponse = resp.json().await?;
    Ok(rpc_response)
}

/// Call a method and deserialize its result, turning an error envelope into
/// an `Err` that names the error kind.
pub async fn rpc_result<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<T, Box<dyn std::error::Error>> {
    let resp = rpc_call(endpoint, method, params).await?;
    into_result(resp)
}

fn into_result<T: serde::de::DeserializeOwned>(
    resp: JsonRpcResponse,
) -> Result<T, Box<dyn std::error::Error>> {
    if !resp.success {
        let kind = resp.error_kind.unwrap_or_else(|| "Error".to_string());
        let message = resp.error.unwrap_or_default();
        return Err(format!("{}: {}", kind, message).into());
    }
    let value = resp.result.unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(value)?)
}
