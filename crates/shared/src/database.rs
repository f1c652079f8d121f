//! 账本数据库
//!
//! 订单、余额、提现与用户四张表共用一个 PostgreSQL 连接池。
//! 服务启动时执行迁移，就绪探针通过 `health_check` 判断存储是否可用。

use crate::config::DatabaseConfig;
use crate::error::{Result, SharedError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// 账本连接池
///
/// 仓储与就绪探针共享同一个池，克隆只增加引用计数。
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 按 `[database]` 配置建立连接池
    ///
    /// `connect_timeout_seconds` 同时限制请求路径与对账 Worker 获取连接的等待时间。
    #[instrument(skip(config))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            max_connections = config.max_connections,
            "连接账本数据库"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!("账本数据库连接池已就绪");

        Ok(Self { pool })
    }

    /// 供各 `Pg*Repository` 使用的连接池
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 就绪探针：执行一次 `SELECT 1`
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(SharedError::from)
    }

    /// 关闭连接池，须在对账 Worker 停止之后调用
    pub async fn close(&self) {
        self.pool.close().await;
        info!("账本数据库连接池已关闭");
    }

    /// 建表迁移：users、orders、balances、withdrawals
    ///
    /// 脚本位于工作区根目录的 `migrations/`，编译期嵌入二进制。
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("账本表结构迁移完成");
        Ok(())
    }
}

impl std::ops::Deref for Database {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}
