//! 测试套件模块
//!
//! 按业务功能组织的测试用例集合。

pub mod auth;
pub mod order_lifecycle;
pub mod rate_limit;
