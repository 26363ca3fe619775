use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use blockscope_core::CoreError;

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::warn!(%status, error = %message, "request failed");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        map_core_error(err)
    }
}

/// Unreachable node → 503, unknown record → 404, bad input → 400, node
/// rejection or undecodable node data → 502.
pub(super) fn map_core_error(err: CoreError) -> AppError {
    if err.is_node_unreachable() {
        return AppError::ServiceUnavailable(format!("bitcoin {err}"));
    }
    match err {
        CoreError::Rpc(rpc) => AppError::BadGateway(format!("bitcoin rpc error: {rpc}")),
        CoreError::TxNotFound(txid) => AppError::NotFound(format!("transaction not found: {txid}")),
        CoreError::BlockNotFound(block) => AppError::NotFound(format!("block not found: {block}")),
        CoreError::NotInMempool(txid) => {
            AppError::NotFound(format!("transaction not in mempool: {txid}"))
        }
        CoreError::InvalidAddress(message) => {
            AppError::BadRequest(format!("invalid address: {message}"))
        }
        CoreError::InvalidTxData(message) => {
            AppError::BadGateway(format!("invalid data from bitcoin node: {message}"))
        }
        other @ (CoreError::DanglingReference { .. } | CoreError::InvalidConfig(_)) => {
            AppError::Internal(other.to_string())
        }
    }
}
