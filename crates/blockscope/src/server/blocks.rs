use axum::extract::{Path, State};
use axum::Json;

use blockscope_core::types::ParseBlockRefError;
use blockscope_core::views::{block_view, BlockView};
use blockscope_core::{BlockRef, CoreError};

use super::error::AppError;
use super::SharedState;

/// `GET /blocks/{height_or_hash}`.
pub(super) async fn get_block(
    State(state): State<SharedState>,
    Path(block): Path<String>,
) -> Result<Json<BlockView>, AppError> {
    let block_ref: BlockRef = block.parse().map_err(map_block_ref_error)?;
    let block = state.rpc.fetch_block(block_ref).await?;
    Ok(Json(block_view(&block)))
}

/// A height no chain can reach is simply a block that does not exist.
fn map_block_ref_error(err: ParseBlockRefError) -> AppError {
    match err {
        ParseBlockRefError::HeightOutOfRange(height) => {
            CoreError::BlockNotFound(format!("height {height}")).into()
        }
        other => AppError::BadRequest(other.to_string()),
    }
}
