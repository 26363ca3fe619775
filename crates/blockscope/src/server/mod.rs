mod balance;
mod blocks;
mod error;
mod mempool;
mod network;
mod transactions;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use blockscope_core::rpc::NodeRpc;

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub rpc: Arc<dyn NodeRpc>,
    pub network: bitcoin::Network,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    Router::new()
        .route("/", get(network::health))
        .route("/blocks/{block}", get(blocks::get_block))
        .route("/transactions/{txid}", get(transactions::get_transaction))
        .route("/balance/{address}", get(balance::get_balance))
        .route("/mempool", get(mempool::get_mempool))
        .route("/network/info", get(network::get_network_info))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn route_not_found() -> error::AppError {
    error::AppError::NotFound("route not found".to_string())
}
