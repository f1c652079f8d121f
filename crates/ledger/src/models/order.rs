use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::OrderStatus;

/// 订单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Order {
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    /// 入账积分，仅 PROCESSED 时存在
    pub accrual: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    /// 下次允许对账的时间，仅 NEW/PROCESSING 时有意义
    pub next_sync_at: DateTime<Utc>,
}

/// 待对账订单（对账 Worker 的最小视图）
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PendingOrder {
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
}

/// 订单插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// 新订单已登记
    Inserted,
    /// 订单号已存在，附带现有归属用户
    Exists { owner_id: i64 },
}
