//! 请求和响应的数据传输对象
//!
//! 线上字段使用 snake_case，金额为两位小数，时间为 RFC3339（精确到秒）

pub mod request;
pub mod response;

pub use request::{CredentialsRequest, WithdrawRequest};
pub use response::{BalanceDto, HealthResponse, OrderDto, TokenResponse, WithdrawalDto};
