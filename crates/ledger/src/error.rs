//! 积分账本错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

/// 积分账本错误类型
#[derive(Debug, Error)]
pub enum LedgerError {
    // === 订单相关错误 ===
    #[error("订单号格式无效")]
    InvalidOrderNumber,

    #[error("订单已被其他用户提交: {0}")]
    AnotherUserOrder(String),

    // === 余额相关错误 ===
    #[error("提现金额必须大于 0")]
    InvalidAmount,

    #[error("余额不足: user_id={user_id}, 需要 {required}")]
    InsufficientFunds { user_id: i64, required: i64 },

    #[error("重复的提现订单号: {0}")]
    DuplicateWithdrawal(String),

    // === 用户相关错误 ===
    #[error("登录名已存在: {0}")]
    UserAlreadyExists(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分账本 Result 类型别名
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// 检查是否为可重试的错误
    ///
    /// 请求路径上不做内部重试，由调用方在传输层决定是否重发。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidOrderNumber => "INVALID_ORDER_NUMBER",
            Self::AnotherUserOrder(_) => "ANOTHER_USER_ORDER",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::DuplicateWithdrawal(_) => "DUPLICATE_WITHDRAWAL",
            Self::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// 判断 sqlx 错误是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
