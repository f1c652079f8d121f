//! 积分账本
//!
//! 忠诚度积分系统的核心：订单登记、余额账本与订单状态对账。
//!
//! ## 模块
//!
//! - `luhn` / `money`: 订单号校验与金额换算（最小货币单位）
//! - `models`: 订单、余额、提现与用户实体
//! - `repository`: PostgreSQL 仓储与 trait 抽象
//! - `service`: 订单提交与余额账本服务
//! - `accrual`: 外部积分计算服务网关
//! - `worker`: 对账 Worker
//! - `test_utils`: 内存仓储与脚本化网关

pub mod accrual;
pub mod error;
pub mod luhn;
pub mod models;
pub mod money;
pub mod repository;
pub mod service;
pub mod test_utils;
pub mod worker;

pub use error::{LedgerError, Result};
