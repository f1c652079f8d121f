//! Mock 服务实现

mod accrual_service;
mod rate_limit;

pub use accrual_service::{
    AccrualServiceState, MockAccrualConfig, RegisterOrderRequest, ScriptOrderRequest,
    accrual_router,
};
pub use rate_limit::FixedWindowLimiter;
