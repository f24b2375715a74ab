// crates/laurel-rpc/src/lib.rs
//
// laurel-rpc: JSON-RPC server and handlers for the Laurel badge staking
// engine.
//
// A single tonic service accepts JSON-encoded `{method, params}` envelopes
// and dispatches them to typed handlers. Each staking operation has its own
// request and response type, validated at the boundary.

pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main server type for ergonomic access.
pub use handlers::RpcError;
pub use server::{JsonRpcRequest, JsonRpcResponse, LaurelRpcServer, RpcConfig};
