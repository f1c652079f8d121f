//! 后台 Worker
//!
//! - `reconciliation`: 订单状态对账与积分入账

mod reconciliation;

pub use reconciliation::{
    CycleReport, ReconciliationConfig, ReconciliationWorker, SchedulerState, WorkerHandle,
};
