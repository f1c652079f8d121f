//! 领域模型
//!
//! 订单、余额、提现记录与用户。金额字段均为最小货币单位。

mod balance;
mod enums;
mod order;
mod user;

pub use balance::{Balance, Withdrawal};
pub use enums::OrderStatus;
pub use order::{InsertOrderResult, Order, PendingOrder};
pub use user::User;
