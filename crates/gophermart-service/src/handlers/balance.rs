//! 余额、提现与提现记录

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gophermart_ledger::LedgerError;
use gophermart_ledger::luhn::normalize_order_number;

use crate::auth::Claims;
use crate::dto::{BalanceDto, WithdrawRequest, WithdrawalDto};
use crate::error::Result;
use crate::state::AppState;

/// 查询余额
///
/// GET /api/user/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BalanceDto>> {
    let balance = state.ledger.balance(claims.user_id()?).await?;
    Ok(Json(balance.into()))
}

/// 提现
///
/// POST /api/user/balance/withdraw
///
/// 提现订单号同样要通过 Luhn 校验，但不要求是已提交的订单。
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let user_id = claims.user_id()?;
    let Json(req) = payload?;

    let number = normalize_order_number(&req.order).ok_or(LedgerError::InvalidOrderNumber)?;
    state.ledger.withdraw(user_id, &number, req.sum).await?;

    Ok(StatusCode::OK)
}

/// 查询提现记录，按处理时间升序；没有记录时 204
///
/// GET /api/user/withdrawals
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response> {
    let withdrawals = state.ledger.list_withdrawals(claims.user_id()?).await?;
    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let dtos: Vec<WithdrawalDto> = withdrawals.into_iter().map(WithdrawalDto::from).collect();
    Ok(Json(dtos).into_response())
}
