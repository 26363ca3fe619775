use axum::extract::{Path, State};
use axum::Json;

use blockscope_core::balance::lookup_balance;
use blockscope_core::views::{balance_view, BalanceView};

use super::error::AppError;
use super::SharedState;

/// `GET /balance/{address}`.
pub(super) async fn get_balance(
    State(state): State<SharedState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceView>, AppError> {
    let balance = lookup_balance(state.rpc.as_ref(), &address, state.network).await?;
    Ok(Json(balance_view(&balance, state.network)))
}
