//! 测试环境管理
//!
//! 在同一个 tokio 运行时内启动全部组件，均绑定 127.0.0.1 的随机端口。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use gophermart_ledger::accrual::AccrualHttpClient;
use gophermart_ledger::test_utils::MemoryLedgerStore;
use gophermart_ledger::worker::{ReconciliationConfig, ReconciliationWorker, WorkerHandle};
use gophermart_service::{AppState, auth::JwtConfig, build_app};
use gophermart_shared::config::AccrualConfig;
use mock_accrual::services::{AccrualServiceState, MockAccrualConfig, accrual_router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::super::helpers::{AccrualControl, ApiClient};

/// 测试环境配置
#[derive(Debug, Clone)]
pub struct TestEnvConfig {
    /// Mock 积分服务每分钟允许的查询次数，0 表示不限
    pub max_requests_per_minute: u32,
    pub worker: ReconciliationConfig,
}

impl Default for TestEnvConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: 0,
            worker: ReconciliationConfig {
                poll_interval: Duration::from_millis(100),
                batch_size: 10,
                max_in_flight: 10,
                debounce: Duration::from_millis(50),
                cooldown: Duration::from_secs(60),
            },
        }
    }
}

/// 测试环境
pub struct TestEnvironment {
    pub service_url: String,
    pub accrual: AccrualControl,
    pub accrual_state: Arc<AccrualServiceState>,
    pub store: Arc<MemoryLedgerStore>,
    worker: Option<WorkerHandle>,
    servers: Vec<JoinHandle<()>>,
}

impl TestEnvironment {
    /// 使用默认配置启动
    pub async fn start() -> Result<Self> {
        Self::with_config(TestEnvConfig::default()).await
    }

    pub async fn with_config(config: TestEnvConfig) -> Result<Self> {
        let mut servers = Vec::new();

        // Mock 积分计算服务
        let accrual_state = Arc::new(AccrualServiceState::new(MockAccrualConfig {
            max_requests_per_minute: config.max_requests_per_minute,
        }));
        let (accrual_addr, handle) = serve(accrual_router(accrual_state.clone())).await?;
        servers.push(handle);

        // 内存账本 + 对账 Worker，积分服务地址不带 scheme
        let store = Arc::new(MemoryLedgerStore::new());
        let gateway = Arc::new(AccrualHttpClient::new(&AccrualConfig {
            base_url: accrual_addr.to_string(),
            request_timeout_ms: 2_000,
        })?);
        let worker = Arc::new(ReconciliationWorker::new(
            store.clone(),
            gateway,
            config.worker,
        ));
        let worker = worker.start();

        // HTTP 服务
        let state = AppState::new(
            store.clone(),
            store.clone(),
            store.clone(),
            JwtConfig {
                secret: "e2e-secret".to_string(),
                expires_in_secs: 3600,
                issuer: "gophermart".to_string(),
            },
            4,
        );
        let (service_addr, handle) = serve(build_app(state, Duration::from_secs(5))).await?;
        servers.push(handle);

        Ok(Self {
            service_url: format!("http://{}", service_addr),
            accrual: AccrualControl::new(&format!("http://{}", accrual_addr)),
            accrual_state,
            store,
            worker,
            servers,
        })
    }

    /// 新的未登录客户端
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.service_url)
    }

    /// 注册一个新用户并返回已登录的客户端
    pub async fn user(&self, login: &str) -> Result<ApiClient> {
        let mut client = self.client();
        let status = client.register(login, &format!("{}-password", login)).await?;
        anyhow::ensure!(status.is_success(), "注册 {} 失败: {}", login, status);
        Ok(client)
    }

    /// 停止 Worker 与所有服务
    pub async fn shutdown(mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop().await;
        }
        for server in self.servers.drain(..) {
            server.abort();
        }
    }
}

async fn serve(app: axum::Router) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((addr, handle))
}
