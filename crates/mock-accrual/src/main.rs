//! Mock 积分计算服务入口
//!
//! ```bash
//! mock-accrual --port 8081 --max-requests-per-minute 100
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use mock_accrual::services::{AccrualServiceState, MockAccrualConfig, accrual_router};
use tracing::info;

/// Mock 积分计算服务
#[derive(Debug, Parser)]
#[command(name = "mock-accrual", version, about)]
struct Cli {
    /// 监听端口
    #[arg(short, long, env = "ACCRUAL_PORT", default_value_t = 8081)]
    port: u16,

    /// 每分钟允许的查询次数，0 表示不限
    #[arg(long, env = "ACCRUAL_MAX_RPM", default_value_t = 0)]
    max_requests_per_minute: u32,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数指定的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let state = Arc::new(AccrualServiceState::new(MockAccrualConfig {
        max_requests_per_minute: cli.max_requests_per_minute,
    }));
    let app = accrual_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        max_requests_per_minute = cli.max_requests_per_minute,
        "Mock 积分计算服务已启动"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("收到停止信号");
        })
        .await?;

    Ok(())
}
