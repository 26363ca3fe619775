use axum::extract::{Path, State};
use axum::Json;

use blockscope_core::enrich_transaction;
use blockscope_core::views::{transaction_view, TransactionView};

use super::error::AppError;
use super::SharedState;

/// `GET /transactions/{txid}`.
pub(super) async fn get_transaction(
    State(state): State<SharedState>,
    Path(txid_str): Path<String>,
) -> Result<Json<TransactionView>, AppError> {
    let txid: bitcoin::Txid = txid_str
        .parse()
        .map_err(|e| AppError::BadRequest(format!("invalid txid: {e}")))?;

    let enriched = enrich_transaction(state.rpc.as_ref(), txid).await?;
    Ok(Json(transaction_view(&enriched)))
}
