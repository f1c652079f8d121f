//! 积分计算服务网关
//!
//! 外部积分计算服务的查询接口。对外词汇（如 `REGISTERED`）在这里映射为
//! 本地四值订单状态，无法映射的值作为硬错误上抛。

mod client;

pub use client::AccrualHttpClient;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::OrderStatus;

/// 积分计算服务回报
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualReport {
    pub number: String,
    pub status: OrderStatus,
    /// 积分（最小货币单位），仅 PROCESSED 时有意义
    pub accrual: Option<i64>,
}

/// 积分计算服务错误
#[derive(Debug, Error)]
pub enum AccrualError {
    /// 被限流，调度信号而非订单失败
    #[error("积分服务限流 (retry_after={retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("未知的订单状态: {0}")]
    UnknownStatus(String),

    #[error("积分服务返回异常状态码: {0}")]
    UnexpectedStatus(u16),

    #[error("积分服务请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("积分服务响应无效: {0}")]
    InvalidPayload(String),
}

impl AccrualError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// 指标标签
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::UnknownStatus(_) => "unknown_status",
            Self::UnexpectedStatus(_) => "unexpected_status",
            Self::Transport(_) => "transport",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

/// 积分计算服务网关
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccrualGateway: Send + Sync {
    /// 查询订单当前的积分计算状态
    async fn order_status(&self, number: &str) -> Result<AccrualReport, AccrualError>;
}

/// 外部状态词汇到本地状态的映射
pub fn map_status(raw: &str) -> Result<OrderStatus, AccrualError> {
    match raw {
        "REGISTERED" => Ok(OrderStatus::New),
        "PROCESSING" => Ok(OrderStatus::Processing),
        "INVALID" => Ok(OrderStatus::Invalid),
        "PROCESSED" => Ok(OrderStatus::Processed),
        other => Err(AccrualError::UnknownStatus(other.to_string())),
    }
}
