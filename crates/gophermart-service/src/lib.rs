//! 积分商城 HTTP 服务
//!
//! 提供用户注册登录、订单提交、余额查询与提现的 REST API，
//! 业务规则全部委托给 `gophermart-ledger`。
//!
//! ## 模块结构
//!
//! - `auth`: JWT 与密码哈希
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型与状态码映射
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 认证中间件
//! - `routes`: 路由配置
//! - `state`: 应用状态

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use routes::build_app;
pub use state::AppState;
