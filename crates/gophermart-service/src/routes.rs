//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射与全局中间件

use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use gophermart_shared::observability::middleware as obs_middleware;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

use crate::{handlers, middleware::auth_middleware, state::AppState};

/// 构建 `/api/user` 下的路由
///
/// 注册与登录公开，其余路由需要认证
pub fn user_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/orders",
            post(handlers::orders::submit_order).get(handlers::orders::list_orders),
        )
        .route("/balance", get(handlers::balance::get_balance))
        .route("/balance/withdraw", post(handlers::balance::withdraw))
        .route("/withdrawals", get(handlers::balance::list_withdrawals))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(handlers::user::register))
        .route("/login", post(handlers::user::login))
        .merge(protected)
}

/// 构建完整应用
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/user", user_routes(state.clone()))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        // 可观测性中间件：请求追踪和指标收集
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
