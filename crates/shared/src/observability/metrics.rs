//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
///
/// 这些描述会出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "orders_submitted_total",
        "Order submissions grouped by outcome"
    );
    metrics::describe_counter!("withdrawals_total", "Withdrawal requests grouped by outcome");

    metrics::describe_counter!(
        "accrual_requests_total",
        "Accrual service queries grouped by outcome"
    );
    metrics::describe_histogram!(
        "accrual_request_duration_seconds",
        "Accrual service query duration in seconds"
    );
    metrics::describe_counter!(
        "accrual_credited_minor_units_total",
        "Loyalty points credited to balances, in minor units"
    );

    metrics::describe_counter!(
        "reconciliation_cycles_total",
        "Reconciliation poll cycles that fetched at least one order"
    );
    metrics::describe_counter!(
        "reconciliation_cooldowns_total",
        "Cooldowns entered after the accrual service rate limited us"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录订单提交结果
#[inline]
pub fn record_order_submission(outcome: &'static str) {
    metrics::counter!("orders_submitted_total", "outcome" => outcome).increment(1);
}

/// 记录提现结果
#[inline]
pub fn record_withdrawal(outcome: &'static str) {
    metrics::counter!("withdrawals_total", "outcome" => outcome).increment(1);
}

/// 记录一次积分服务查询
#[inline]
pub fn record_accrual_request(outcome: &'static str, duration_secs: f64) {
    metrics::counter!("accrual_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("accrual_request_duration_seconds", "outcome" => outcome)
        .record(duration_secs);
}

/// 记录入账积分（最小货币单位）
#[inline]
pub fn record_accrual_credit(minor_units: i64) {
    metrics::counter!("accrual_credited_minor_units_total")
        .increment(u64::try_from(minor_units).unwrap_or(0));
}

/// 记录一次对账轮询
#[inline]
pub fn record_reconciliation_cycle() {
    metrics::counter!("reconciliation_cycles_total").increment(1);
}

/// 记录一次限流冷却
#[inline]
pub fn record_cooldown() {
    metrics::counter!("reconciliation_cooldowns_total").increment(1);
}
