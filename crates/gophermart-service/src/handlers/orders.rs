//! 订单提交与查询

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gophermart_ledger::service::SubmitOutcome;

use crate::auth::Claims;
use crate::dto::OrderDto;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 提交订单号（text/plain）
///
/// POST /api/user/orders
///
/// 新订单 202，同一用户重复提交 200。
pub async fn submit_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: String,
) -> Result<StatusCode> {
    let user_id = claims.user_id()?;
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("订单号为空".to_string()));
    }

    match state.intake.submit(user_id, &body).await? {
        SubmitOutcome::Accepted => Ok(StatusCode::ACCEPTED),
        SubmitOutcome::AlreadyOwnedBySameUser => Ok(StatusCode::OK),
    }
}

/// 查询订单列表，按上传时间升序；没有订单时 204
///
/// GET /api/user/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response> {
    let orders = state.intake.list_orders(claims.user_id()?).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let dtos: Vec<OrderDto> = orders.into_iter().map(OrderDto::from).collect();
    Ok(Json(dtos).into_response())
}
