//! 积分商城端到端测试
//!
//! 进程内启动 Mock 积分计算服务、HTTP 服务与对账 Worker（内存账本），
//! 通过真实 HTTP 调用覆盖完整业务流程：
//! - 注册登录与认证
//! - 订单提交、状态推进与入账
//! - 提现与余额一致性
//! - 积分服务限流后的冷却

pub mod helpers;
pub mod setup;
pub mod suites;

pub use setup::TestEnvironment;
