//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Balance, InsertOrderResult, Order, OrderStatus, PendingOrder, User, Withdrawal,
};

/// 订单仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    /// 以 NEW 状态登记订单；订单号已存在时返回现有归属
    async fn insert_order(&self, user_id: i64, number: &str) -> Result<InsertOrderResult>;

    /// 按上传时间升序列出用户订单
    async fn list_user_orders(&self, user_id: i64) -> Result<Vec<Order>>;
}

/// 余额与提现仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceRepositoryTrait: Send + Sync {
    /// 单事务扣款并写入提现记录
    ///
    /// 余额不足返回 `InsufficientFunds`，提现订单号重复返回 `DuplicateWithdrawal`，
    /// 两种情况下扣款都不会生效。
    async fn withdraw(&self, user_id: i64, order_number: &str, amount: i64)
    -> Result<Withdrawal>;

    /// 确保余额行存在后读取
    async fn balance(&self, user_id: i64) -> Result<Balance>;

    /// 按处理时间升序列出提现记录
    async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>>;
}

/// 对账仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReconciliationRepositoryTrait: Send + Sync {
    /// 拉取到期的 NEW/PROCESSING 订单，最早到期的优先
    async fn list_pending(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<PendingOrder>>;

    /// 状态未变化，只推迟下次对账时间
    async fn touch_sync(&self, number: &str, next_sync_at: DateTime<Utc>) -> Result<()>;

    /// 更新为非 PROCESSED 的新状态并推迟下次对账时间
    async fn update_status(
        &self,
        number: &str,
        status: OrderStatus,
        next_sync_at: DateTime<Utc>,
    ) -> Result<()>;

    /// 单事务标记 PROCESSED 并为订单归属用户入账
    ///
    /// 订单已是 PROCESSED 时不做任何变更并返回 `false`。
    async fn apply_accrual(&self, number: &str, accrual: i64) -> Result<bool>;
}

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// 创建用户；登录名冲突返回 `UserAlreadyExists`
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User>;

    async fn find_by_login(&self, login: &str) -> Result<Option<User>>;
}
