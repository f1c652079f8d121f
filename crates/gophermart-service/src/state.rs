//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use gophermart_ledger::repository::{
    BalanceRepositoryTrait, OrderRepositoryTrait, UserRepositoryTrait,
};
use gophermart_ledger::service::{BalanceLedgerService, OrderIntakeService};
use gophermart_shared::database::Database;

use crate::auth::{JwtConfig, JwtManager};

/// Axum 应用共享状态
///
/// 服务与仓储通过 Arc 在 handler 间共享；`db` 仅用于就绪探针，
/// 内存存储（测试）下为空。
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<OrderIntakeService>,
    pub ledger: Arc<BalanceLedgerService>,
    pub users: Arc<dyn UserRepositoryTrait>,
    pub jwt_manager: Arc<JwtManager>,
    /// bcrypt 计算成本
    pub password_cost: u32,
    pub db: Option<Database>,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderRepositoryTrait>,
        balances: Arc<dyn BalanceRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        jwt_config: JwtConfig,
        password_cost: u32,
    ) -> Self {
        Self {
            intake: Arc::new(OrderIntakeService::new(orders)),
            ledger: Arc::new(BalanceLedgerService::new(balances)),
            users,
            jwt_manager: Arc::new(JwtManager::new(jwt_config)),
            password_cost,
            db: None,
        }
    }

    /// 挂上数据库连接，用于就绪探针
    pub fn with_database(mut self, db: Database) -> Self {
        self.db = Some(db);
        self
    }
}
