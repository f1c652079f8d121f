//! 测试辅助工具

mod accrual_control;
mod api_client;

use std::future::Future;
use std::time::{Duration, Instant};

pub use accrual_control::AccrualControl;
pub use api_client::{ApiClient, BalanceView, OrderView, WithdrawalView};

/// 轮询直到条件成立或超时，返回条件最终是否成立
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
