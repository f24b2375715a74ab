// crates/laurel-rpc/src/server.rs
//
// RPC server setup: LaurelRpcServer and RpcConfig.
//
// A single tonic unary service accepts JSON-encoded requests with a method
// field, dispatches to the matching typed handler, and returns JSON-encoded
// responses. No proto codegen is involved; tonic provides the transport and
// interceptor plumbing.

use std::sync::Arc;
use std::time::Instant;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tonic::transport::Server;
use tonic::Status;

use laurel_staking::StakingService;

use crate::handlers::{self, RpcError};
use crate::middleware;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50071,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
/// The client sends a method name and a JSON params payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "staking/stake", "staking/pending").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope: `{success, result, error, errorKind}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// The result data (if success).
    pub result: Option<serde_json::Value>,
    /// Error message (if not success).
    pub error: Option<String>,
    /// Error taxonomy kind (if not success), e.g. "NotStaked".
    #[serde(default)]
    pub error_kind: Option<String>,
}

impl JsonRpcResponse {
    fn failure(err: RpcError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.message),
            error_kind: Some(err.kind),
        }
    }
}

// ---------------------------------------------------------------------------
// LaurelRpcServer
// ---------------------------------------------------------------------------

/// The RPC server for the staking engine.
#[derive(Clone)]
pub struct LaurelRpcServer {
    config: RpcConfig,
    inner: LaurelServiceImpl,
}

impl std::fmt::Debug for LaurelRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaurelRpcServer")
            .field("config", &self.config)
            .field("store_backend", &self.inner.store_backend)
            .finish()
    }
}

impl LaurelRpcServer {
    /// Create a new server over a shared staking service.
    pub fn new(config: RpcConfig, service: Arc<StakingService>) -> Self {
        Self {
            config,
            inner: LaurelServiceImpl {
                service,
                store_backend: "unknown".to_string(),
                start_time: None,
            },
        }
    }

    /// Set the ledger backend name reported by `node/info`.
    pub fn with_store_backend(mut self, backend: impl Into<String>) -> Self {
        self.inner.store_backend = backend.into();
        self
    }

    /// Set the daemon start time for uptime calculation.
    pub fn with_start_time(mut self, st: Instant) -> Self {
        self.inner.start_time = Some(st);
        self
    }

    /// Dispatch one envelope without going through the transport.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.inner.dispatch(request).await
    }

    /// Start the RPC server and listen for requests.
    ///
    /// Binds to the configured address and serves until the process is
    /// terminated.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        tracing::info!("Laurel RPC server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                LaurelJsonRpcServer::new(self.inner.clone()),
                middleware::logging_interceptor,
            ))
            .serve(addr)
            .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Shared state behind the transport: the staking service and node metadata.
#[derive(Clone)]
struct LaurelServiceImpl {
    service: Arc<StakingService>,
    store_backend: String,
    start_time: Option<Instant>,
}

impl LaurelServiceImpl {
    /// Dispatch a JSON-RPC request to the appropriate handler based on the method name.
    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let started = Instant::now();
        let method = request.method.clone();
        let svc = self.service.clone();

        let result = match request.method.as_str() {
            // Staking operations
            "staking/stake" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_stake(&svc, r).await
                })
                .await
            }
            "staking/unstake" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_unstake(&svc, r).await
                })
                .await
            }
            "staking/claim" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_claim(&svc, r).await
                })
                .await
            }
            "staking/pending" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_pending_points(&svc, r).await
                })
                .await
            }
            "staking/settle" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_settle(&svc, r).await
                })
                .await
            }

            // Staking queries
            "staking/is_staked" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_is_staked(&svc, r).await
                })
                .await
            }
            "staking/tokens" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_staked_tokens(&svc, r).await
                })
                .await
            }
            "staking/summary" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_owner_summary(&svc, r).await
                })
                .await
            }
            "staking/receipt" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::staking::handle_receipt(&svc, r).await
                })
                .await
            }

            // Node
            "node/info" => {
                let backend = self.store_backend.clone();
                let start_time = self.start_time;
                dispatch_handler(request.params, |r| async move {
                    handlers::node::handle_get_node_info(r, &svc, &backend, start_time).await
                })
                .await
            }
            "node/health" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::node::handle_get_health(r, &svc).await
                })
                .await
            }

            _ => Err(RpcError::invalid_request(format!(
                "Unknown method: {}",
                request.method
            ))),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                tracing::info!(method = %method, elapsed_ms, "RPC ok");
                JsonRpcResponse {
                    success: true,
                    result: Some(value),
                    error: None,
                    error_kind: None,
                }
            }
            Err(err) => {
                tracing::info!(method = %method, elapsed_ms, kind = %err.kind, "RPC failed: {}", err.message);
                JsonRpcResponse::failure(err)
            }
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, RpcError>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Result<Resp, RpcError>>,
{
    // Parameterless methods accept a missing params field.
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| RpcError::invalid_request(format!("Failed to deserialize request: {}", e)))?;
    let response = handler(request).await?;
    serde_json::to_value(response)
        .map_err(|e| RpcError::internal(format!("Failed to serialize response: {}", e)))
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// One service, one unary method. Request and response bodies are raw
// JSON-encoded JsonRpcRequest/JsonRpcResponse bytes.

/// The tonic service wrapper. Implements the low-level service by reading
/// the body, deserializing it as JSON-RPC, and dispatching.
#[derive(Clone)]
pub struct LaurelJsonRpcServer {
    inner: LaurelServiceImpl,
}

impl std::fmt::Debug for LaurelJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaurelJsonRpcServer").finish()
    }
}

impl LaurelJsonRpcServer {
    fn new(inner: LaurelServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for LaurelJsonRpcServer {
    const NAME: &'static str = "laurel.rpc.StakingService";
}

impl<B> tower_service::Service<http::Request<B>> for LaurelJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("Failed to read request body: {}", e);
                    let resp = JsonRpcResponse::failure(RpcError::invalid_request(format!(
                        "Failed to read request body: {}",
                        e
                    )));
                    return Ok(build_response(serde_json::to_vec(&resp).unwrap_or_default()));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => {
                    let resp = JsonRpcResponse::failure(RpcError::invalid_request(format!(
                        "Invalid JSON-RPC request: {}",
                        e
                    )));
                    return Ok(build_response(serde_json::to_vec(&resp).unwrap_or_default()));
                }
            };

            let rpc_response = inner.dispatch(rpc_request).await;
            Ok(build_response(
                serde_json::to_vec(&rpc_response).unwrap_or_default(),
            ))
        })
    }
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build an HTTP response with the given JSON body.
fn build_response(json: Vec<u8>) -> http::Response<tonic::body::BoxBody> {
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
