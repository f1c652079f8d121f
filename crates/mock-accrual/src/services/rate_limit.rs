//! 固定窗口限流
//!
//! 每个窗口内最多放行 `limit` 次请求，`limit` 为 0 时不限流。

use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct Window {
    started_at: Instant,
    used: u32,
}

/// 固定窗口限流器
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(Window {
                started_at: Instant::now(),
                used: 0,
            }),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 尝试占用一次额度
    pub fn try_acquire(&self) -> bool {
        if self.limit == 0 {
            return true;
        }

        let mut state = self.state.lock();
        if state.started_at.elapsed() >= self.window {
            state.started_at = Instant::now();
            state.used = 0;
        }
        if state.used >= self.limit {
            return false;
        }
        state.used += 1;
        true
    }
}
