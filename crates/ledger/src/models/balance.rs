use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// 用户余额
///
/// 首次访问时惰性创建；`current` 恒不小于 0。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct Balance {
    pub user_id: i64,
    pub current: i64,
    pub withdrawn: i64,
}

/// 提现记录
///
/// 一次成功扣款生成一条，之后不可变；`order_number` 全局唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub amount: i64,
    pub processed_at: DateTime<Utc>,
}
