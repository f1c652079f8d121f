//! 数据库仓储层
//!
//! 提供订单、余额、提现与用户的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 跨实体的资金变动（扣款+提现记录、状态+入账）各自在单个事务内完成
//! - 唯一约束冲突在仓储层翻译为业务结果，其余数据库错误原样上抛
//! - 定义 trait 接口以支持 mock 测试

mod balance_repo;
mod order_repo;
mod reconciliation_repo;
mod traits;
mod user_repo;

pub use balance_repo::PgBalanceRepository;
pub use order_repo::PgOrderRepository;
pub use reconciliation_repo::PgReconciliationRepository;
pub use traits::*;
pub use user_repo::PgUserRepository;
