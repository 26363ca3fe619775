use axum::extract::State;
use axum::Json;

use blockscope_core::views::{mempool_view, MempoolView};

use super::error::AppError;
use super::SharedState;

/// `GET /mempool`.
pub(super) async fn get_mempool(
    State(state): State<SharedState>,
) -> Result<Json<MempoolView>, AppError> {
    let summary = state.rpc.get_mempool_info().await?;
    let entries = state.rpc.get_raw_mempool().await?;
    Ok(Json(mempool_view(&summary, &entries)))
}
