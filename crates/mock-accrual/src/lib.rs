//! Mock 积分计算服务
//!
//! 模拟外部积分计算服务，用于开发和测试环境。
//!
//! # 主要模块
//!
//! - `models`: 订单与状态
//! - `store`: 内存存储
//! - `services`: HTTP 路由与限流
//!
//! # 使用示例
//!
//! ```rust
//! use std::sync::Arc;
//! use mock_accrual::services::{AccrualServiceState, MockAccrualConfig, accrual_router};
//!
//! let state = Arc::new(AccrualServiceState::new(MockAccrualConfig::default()));
//! let app = accrual_router(state);
//! ```

pub mod models;
pub mod services;
pub mod store;
