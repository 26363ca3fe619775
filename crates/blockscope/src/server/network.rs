use axum::extract::State;
use axum::Json;

use blockscope_core::views::{health_view, network_view, HealthView, NetworkView};

use super::error::AppError;
use super::SharedState;

/// `GET /`. Any node failure, including a rejected call, reports the
/// service as unavailable.
pub(super) async fn health(State(state): State<SharedState>) -> Result<Json<HealthView>, AppError> {
    let info = state.rpc.get_blockchain_info().await.map_err(|err| {
        AppError::ServiceUnavailable(format!("Bitcoin node connection error: {err}"))
    })?;
    Ok(Json(health_view(&info)))
}

/// `GET /network/info`.
pub(super) async fn get_network_info(
    State(state): State<SharedState>,
) -> Result<Json<NetworkView>, AppError> {
    let info = state.rpc.get_blockchain_info().await?;
    let mempool = state.rpc.get_mempool_info().await?;
    Ok(Json(network_view(&info, &mempool)))
}
