//! HTTP 层错误类型定义
//!
//! 把账本错误与认证错误统一映射为状态码和 JSON 错误体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gophermart_ledger::LedgerError;
use serde_json::json;

const INTERNAL_MESSAGE: &str = "服务内部错误，请稍后重试";

/// HTTP 层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("登录名或密码错误")]
    InvalidCredentials,

    // 请求错误
    #[error("请求格式错误: {0}")]
    BadRequest(String),
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 业务错误
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    // 系统错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Ledger(err) => match err {
                LedgerError::InvalidOrderNumber => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::AnotherUserOrder(_)
                | LedgerError::DuplicateWithdrawal(_)
                | LedgerError::UserAlreadyExists(_) => StatusCode::CONFLICT,
                LedgerError::InvalidAmount => StatusCode::BAD_REQUEST,
                LedgerError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
                LedgerError::Database(_) | LedgerError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Ledger(err) => err.error_code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_system_error(&self) -> bool {
        match self {
            Self::Ledger(err) => !err.is_business_error(),
            Self::Internal(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，细节只进日志
        let message = if self.is_system_error() {
            tracing::error!(error = %self, "请求处理失败");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// HTTP 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_status_mapping() {
        let cases = [
            (LedgerError::InvalidOrderNumber, StatusCode::UNPROCESSABLE_ENTITY),
            (
                LedgerError::AnotherUserOrder("12345678903".to_string()),
                StatusCode::CONFLICT,
            ),
            (LedgerError::InvalidAmount, StatusCode::BAD_REQUEST),
            (
                LedgerError::InsufficientFunds {
                    user_id: 1,
                    required: 100,
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                LedgerError::DuplicateWithdrawal("2377225624".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::UserAlreadyExists("alice".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
    }

    #[tokio::test]
    async fn test_system_error_hides_details() {
        let response =
            ApiError::from(LedgerError::Internal("connection reset".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["message"], INTERNAL_MESSAGE);
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_business_error_keeps_code() {
        let err = ApiError::from(LedgerError::InsufficientFunds {
            user_id: 1,
            required: 100,
        });
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
        assert!(!err.is_system_error());
    }
}
