//! 请求 DTO 定义

use gophermart_ledger::money;
use serde::Deserialize;
use validator::Validate;

/// 注册/登录请求
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 64, message = "登录名长度必须在 1-64 之间"))]
    pub login: String,
    #[validate(length(min = 1, max = 72, message = "密码长度必须在 1-72 之间"))]
    pub password: String,
}

/// 提现请求
///
/// `sum` 在反序列化时即换算为最小货币单位
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    #[serde(with = "money::decimal")]
    pub sum: i64,
}
