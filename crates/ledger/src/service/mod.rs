//! 业务服务层
//!
//! - `order_intake`: 订单提交（幂等登记与归属判定）
//! - `balance_ledger`: 余额查询、提现扣款与提现记录

mod balance_ledger;
mod order_intake;

pub use balance_ledger::BalanceLedgerService;
pub use order_intake::{OrderIntakeService, SubmitOutcome};
