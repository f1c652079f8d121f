//! Mock 积分计算服务
//!
//! 提供与外部积分计算服务一致的 REST API：
//! - `POST /api/orders`：登记订单
//! - `GET /api/orders/{number}`：查询订单积分状态，每次查询前进一步
//! - `PUT /api/orders/{number}`：直接设置状态，用于脚本化场景

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::rate_limit::FixedWindowLimiter;
use crate::models::{AccrualOrder, AccrualStatus};
use crate::store::MemoryStore;

/// 限流后建议的重试间隔（秒）
const RETRY_AFTER_SECS: &str = "60";

/// Mock 服务配置
#[derive(Debug, Clone, Default)]
pub struct MockAccrualConfig {
    /// 每分钟允许的查询次数，0 表示不限
    pub max_requests_per_minute: u32,
}

/// 服务状态
pub struct AccrualServiceState {
    pub orders: MemoryStore<AccrualOrder>,
    limiter: FixedWindowLimiter,
}

impl AccrualServiceState {
    pub fn new(config: MockAccrualConfig) -> Self {
        Self {
            orders: MemoryStore::new(),
            limiter: FixedWindowLimiter::per_minute(config.max_requests_per_minute),
        }
    }
}

impl Default for AccrualServiceState {
    fn default() -> Self {
        Self::new(MockAccrualConfig::default())
    }
}

// ============================================================================
// 请求 DTO
// ============================================================================

/// 登记订单请求
#[derive(Debug, Deserialize)]
pub struct RegisterOrderRequest {
    pub order: String,
    /// 商品明细，仅用于兼容，不参与计算
    #[serde(default)]
    pub goods: Vec<serde_json::Value>,
}

/// 设置订单状态请求
#[derive(Debug, Deserialize)]
pub struct ScriptOrderRequest {
    pub status: AccrualStatus,
    #[serde(default)]
    pub accrual: Option<f64>,
}

// ============================================================================
// 路由定义
// ============================================================================

/// 构建积分服务路由
pub fn accrual_router(state: Arc<AccrualServiceState>) -> Router {
    Router::new()
        .route("/api/orders", post(register_order))
        .route("/api/orders/{number}", get(get_order).put(script_order))
        .with_state(state)
}

// ============================================================================
// 路由处理器
// ============================================================================

/// POST /api/orders
async fn register_order(
    State(state): State<Arc<AccrualServiceState>>,
    Json(req): Json<RegisterOrderRequest>,
) -> StatusCode {
    if state
        .orders
        .insert_if_absent(&req.order, AccrualOrder::registered(&req.order))
    {
        info!(order = %req.order, goods = req.goods.len(), "登记订单");
        StatusCode::ACCEPTED
    } else {
        warn!(order = %req.order, "订单已登记");
        StatusCode::CONFLICT
    }
}

/// GET /api/orders/{number}
///
/// 返回当前状态后前进一步。
async fn get_order(
    State(state): State<Arc<AccrualServiceState>>,
    Path(number): Path<String>,
) -> Response {
    if !state.limiter.try_acquire() {
        warn!(order = %number, "超出每分钟请求额度");
        return rate_limited(state.limiter.limit());
    }

    let current = state.orders.update(&number, |order| {
        let snapshot = order.clone();
        order.advance();
        snapshot
    });

    match current {
        Some(order) => {
            debug!(order = %number, status = ?order.status, "查询订单");
            Json(order).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// PUT /api/orders/{number}
async fn script_order(
    State(state): State<Arc<AccrualServiceState>>,
    Path(number): Path<String>,
    Json(req): Json<ScriptOrderRequest>,
) -> Json<AccrualOrder> {
    let order = AccrualOrder::scripted(&number, req.status, req.accrual);
    info!(order = %number, status = ?req.status, accrual = ?req.accrual, "设置订单状态");
    state.orders.insert(&number, order.clone());
    Json(order)
}

fn rate_limited(limit: u32) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        format!("No more than {} requests per minute allowed", limit),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
    response
}

// ============================================================================
// 单元测试
// ============================================================================
