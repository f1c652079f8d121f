//! 模拟数据模型

mod order;

pub use order::{AccrualOrder, AccrualStatus};
