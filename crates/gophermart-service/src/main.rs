//! 积分商城服务入口
//!
//! ```bash
//! gophermart -a :8080 -d postgres://localhost/gophermart -r http://localhost:8081
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gophermart_ledger::accrual::AccrualHttpClient;
use gophermart_ledger::repository::{
    PgBalanceRepository, PgOrderRepository, PgReconciliationRepository, PgUserRepository,
};
use gophermart_ledger::worker::{ReconciliationConfig, ReconciliationWorker};
use gophermart_service::{AppState, auth::JwtConfig, build_app};
use gophermart_shared::{
    config::{AppConfig, ConfigOverrides},
    database::Database,
    observability,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "gophermart-dev-secret-change-in-production";

/// 积分商城服务
#[derive(Debug, Parser)]
#[command(name = "gophermart", version, about)]
struct Cli {
    /// 监听地址，如 `:8080` 或 `localhost:8080`
    #[arg(short = 'a', env = "RUN_ADDRESS")]
    run_address: Option<String>,

    /// PostgreSQL 连接串
    #[arg(short = 'd', env = "DATABASE_URI")]
    database_uri: Option<String>,

    /// 积分计算服务地址
    #[arg(short = 'r', env = "ACCRUAL_SYSTEM_ADDRESS")]
    accrual_address: Option<String>,

    /// JWT 签名密钥
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load("gophermart")?;
    config.apply_overrides(&ConfigOverrides {
        run_address: cli.run_address,
        database_uri: cli.database_uri,
        accrual_address: cli.accrual_address,
        secret_key: cli.secret_key,
    })?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting gophermart on {}", config.server_addr());

    // JWT 密钥：生产环境必须显式配置
    let jwt_secret = match config.auth.jwt_secret.clone() {
        Some(secret) => secret,
        None if config.is_production() => {
            anyhow::bail!("SECRET_KEY must be set in production environment");
        }
        None => {
            warn!("Using default JWT secret - set SECRET_KEY for production");
            DEV_JWT_SECRET.to_string()
        }
    };

    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;

    let pool = db.pool().clone();
    let state = AppState::new(
        Arc::new(PgOrderRepository::new(pool.clone())),
        Arc::new(PgBalanceRepository::new(pool.clone())),
        Arc::new(PgUserRepository::new(pool.clone())),
        JwtConfig::from_auth(jwt_secret, &config.auth),
        config.auth.bcrypt_cost,
    )
    .with_database(db.clone());

    let gateway = Arc::new(AccrualHttpClient::new(&config.accrual)?);
    info!(accrual = gateway.base_url(), "积分计算服务地址");

    let worker = Arc::new(ReconciliationWorker::new(
        Arc::new(PgReconciliationRepository::new(pool)),
        gateway,
        ReconciliationConfig::from(&config.worker),
    ));
    let worker_handle = worker.start();

    let app = build_app(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP 已停止接收请求，再停 Worker，最后关闭连接池
    if let Some(handle) = worker_handle {
        handle.stop().await;
    }
    db.close().await;

    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// SIGTERM 或 Ctrl+C，收到任一信号后触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
