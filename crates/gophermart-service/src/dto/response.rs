//! 响应 DTO 定义

use chrono::{DateTime, SecondsFormat, Utc};
use gophermart_ledger::models::{Balance, Order, OrderStatus, Withdrawal};
use gophermart_ledger::money;
use serde::{Serialize, Serializer};

fn rfc3339<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// 订单
#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub number: String,
    pub status: OrderStatus,
    #[serde(
        with = "money::decimal_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub accrual: Option<i64>,
    #[serde(serialize_with = "rfc3339")]
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            number: order.number,
            status: order.status,
            accrual: order.accrual,
            uploaded_at: order.uploaded_at,
        }
    }
}

/// 余额
#[derive(Debug, Serialize)]
pub struct BalanceDto {
    #[serde(with = "money::decimal")]
    pub current: i64,
    #[serde(with = "money::decimal")]
    pub withdrawn: i64,
}

impl From<Balance> for BalanceDto {
    fn from(balance: Balance) -> Self {
        Self {
            current: balance.current,
            withdrawn: balance.withdrawn,
        }
    }
}

/// 提现记录
#[derive(Debug, Serialize)]
pub struct WithdrawalDto {
    pub order: String,
    #[serde(with = "money::decimal")]
    pub sum: i64,
    #[serde(serialize_with = "rfc3339")]
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalDto {
    fn from(withdrawal: Withdrawal) -> Self {
        Self {
            order: withdrawal.order_number,
            sum: withdrawal.amount,
            processed_at: withdrawal.processed_at,
        }
    }
}

/// 注册/登录成功响应
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: i64,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
}
