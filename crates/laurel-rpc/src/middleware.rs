// crates/laurel-rpc/src/middleware.rs
//
// Middleware for the RPC server: request logging.

use tonic::{Request, Status};

/// Metadata key callers may set to correlate retries of the same call.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logging interceptor for tonic requests.
///
/// Logs the caller-supplied request id, if any, so that a retried
/// Claim can be matched to its first attempt in the logs.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    let request_id = req
        .metadata()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::debug!(request_id, "Incoming RPC request");
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interceptor_passes_request_through() {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert(REQUEST_ID_HEADER, "abc-123".parse().unwrap());
        let out = logging_interceptor(req).unwrap();
        assert_eq!(
            out.metadata().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap(),
            "abc-123"
        );
    }
}
