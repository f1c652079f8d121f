//! 订单对账 Worker
//!
//! 以固定间隔拉取到期的 NEW/PROCESSING 订单，向积分计算服务查询状态并落库：
//! 1. 状态未变化：只推迟下次对账时间（防抖）
//! 2. 变为 PROCESSING/INVALID 等：更新状态并推迟下次对账时间
//! 3. 变为 PROCESSED：单事务更新状态并为用户入账
//!
//! 并发模型：
//! - 单个调度循环，每批最多 `batch_size` 个订单
//! - 信号量限制同时在途的外部查询数，许可一直持有到落库完成
//! - 循环等待整批任务结束后才进入下一轮
//!
//! 限流处理：任一任务收到限流信号即取消本批次，已启动的任务照常完成，
//! 未启动的订单保持 `next_sync_at` 不变，下一轮自然重试。
//! 调度状态只由循环根据本轮报告切换，任务本身不直接修改。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use gophermart_shared::config::WorkerConfig;
use gophermart_shared::observability::metrics;
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, error, info, warn};

use crate::accrual::{AccrualError, AccrualGateway};
use crate::models::{OrderStatus, PendingOrder};
use crate::repository::ReconciliationRepositoryTrait;

/// 对账参数
#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    pub poll_interval: Duration,
    pub batch_size: u32,
    pub max_in_flight: usize,
    pub debounce: Duration,
    pub cooldown: Duration,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

impl From<&WorkerConfig> for ReconciliationConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            batch_size: config.batch_size,
            max_in_flight: config.max_in_flight.max(1),
            debounce: Duration::from_secs(config.debounce_secs),
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }
}

/// 调度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// 按固定间隔轮询
    Polling,
    /// 被限流后冷却，结束后立即轮询一次
    Cooling,
}

/// 单轮对账报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// 本轮拉取到的订单数
    pub fetched: usize,
    /// 实际派发的任务数
    pub dispatched: usize,
    /// 因限流或停机未查询的订单数
    pub skipped: usize,
    pub unchanged: usize,
    pub updated: usize,
    pub credited: usize,
    pub failed: usize,
    /// 本轮有任务收到限流信号
    pub cooldown_requested: bool,
}

impl CycleReport {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Unchanged => self.unchanged += 1,
            TaskOutcome::StatusUpdated => self.updated += 1,
            TaskOutcome::Credited => self.credited += 1,
            TaskOutcome::Failed => self.failed += 1,
            // 已派发但在查询前被取消
            TaskOutcome::Skipped => {
                self.dispatched = self.dispatched.saturating_sub(1);
                self.skipped += 1;
            }
            // 限流与停机中断的订单保持原调度时间，不计入失败
            TaskOutcome::RateLimited | TaskOutcome::Aborted => {}
        }
    }
}

/// 单个订单的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Unchanged,
    StatusUpdated,
    Credited,
    Failed,
    RateLimited,
    Skipped,
    Aborted,
}

/// 运行中的 Worker 句柄
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// 停止 Worker，等待在途任务全部退出
    pub async fn stop(self) {
        self.shutdown.send_replace(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "对账 Worker 异常退出");
        }
        info!("对账 Worker 已停止");
    }
}

/// 订单对账 Worker
pub struct ReconciliationWorker {
    repo: Arc<dyn ReconciliationRepositoryTrait>,
    gateway: Arc<dyn AccrualGateway>,
    config: ReconciliationConfig,
    debounce: TimeDelta,
    limiter: Arc<Semaphore>,
    started: AtomicBool,
}

impl ReconciliationWorker {
    pub fn new(
        repo: Arc<dyn ReconciliationRepositoryTrait>,
        gateway: Arc<dyn AccrualGateway>,
        config: ReconciliationConfig,
    ) -> Self {
        let debounce =
            TimeDelta::from_std(config.debounce).unwrap_or_else(|_| TimeDelta::seconds(120));
        let limiter = Arc::new(Semaphore::new(config.max_in_flight.max(1)));

        Self {
            repo,
            gateway,
            config,
            debounce,
            limiter,
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// 启动调度循环
    ///
    /// 每个实例只能启动一次，重复调用返回 `None`。
    pub fn start(self: &Arc<Self>) -> Option<WorkerHandle> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("对账 Worker 已启动，忽略重复启动");
            return None;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = Arc::clone(self);
        let join = tokio::spawn(async move { worker.run(shutdown_rx).await });

        info!(
            poll_interval = ?self.config.poll_interval,
            batch_size = self.config.batch_size,
            max_in_flight = self.config.max_in_flight,
            "对账 Worker 已启动"
        );

        Some(WorkerHandle {
            shutdown: shutdown_tx,
            join,
        })
    }

    /// 调度主循环
    async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        let period = self.config.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = SchedulerState::Polling;
        loop {
            match state {
                SchedulerState::Cooling => {
                    tokio::select! {
                        biased;
                        _ = cancelled(shutdown.clone()) => break,
                        _ = sleep(self.config.cooldown) => {
                            info!("冷却结束，恢复轮询");
                            ticker.reset_immediately();
                            state = SchedulerState::Polling;
                        }
                    }
                }
                SchedulerState::Polling => {
                    tokio::select! {
                        biased;
                        _ = cancelled(shutdown.clone()) => break,
                        _ = ticker.tick() => {}
                    }

                    let report = self.run_cycle(&shutdown).await;
                    if report.fetched > 0 {
                        debug!(?report, "本轮对账完成");
                    }
                    if report.cooldown_requested {
                        metrics::record_cooldown();
                        warn!(cooldown = ?self.config.cooldown, "积分服务限流，进入冷却");
                        state = SchedulerState::Cooling;
                    }
                }
            }
        }
    }

    /// 执行一轮对账
    ///
    /// 返回前等待本批所有任务结束。`shutdown` 置位后不再派发新任务，
    /// 在途的外部查询被放弃，已开始的落库照常完成。
    pub async fn run_cycle(self: &Arc<Self>, shutdown: &watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();

        let limit = i64::from(self.config.batch_size);
        let orders = match self.repo.list_pending(limit, Utc::now()).await {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, "拉取待对账订单失败");
                return report;
            }
        };

        report.fetched = orders.len();
        if orders.is_empty() {
            return report;
        }

        metrics::record_reconciliation_cycle();
        info!(count = orders.len(), "开始对账");

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);
        let mut tasks = JoinSet::new();

        for order in orders {
            let permit = tokio::select! {
                biased;
                _ = cancelled(cancel_rx.clone()) => None,
                _ = cancelled(shutdown.clone()) => None,
                permit = Arc::clone(&self.limiter).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                break;
            };
            if *cancel_rx.borrow() || *shutdown.borrow() {
                break;
            }

            report.dispatched += 1;
            let worker = Arc::clone(self);
            let cancel_tx = Arc::clone(&cancel_tx);
            let shutdown = shutdown.clone();
            tasks.spawn(async move {
                let _permit = permit;
                worker.reconcile_order(order, &cancel_tx, shutdown).await
            });
        }
        report.skipped = report.fetched - report.dispatched;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!(error = %e, "对账任务异常退出");
                    report.failed += 1;
                }
            }
        }

        report.cooldown_requested = *cancel_rx.borrow();
        if report.skipped > 0 {
            info!(skipped = report.skipped, "本批剩余订单留待下一轮");
        }
        report
    }

    /// 对账单个订单
    async fn reconcile_order(
        &self,
        order: PendingOrder,
        cancel: &watch::Sender<bool>,
        shutdown: watch::Receiver<bool>,
    ) -> TaskOutcome {
        // 批次已被限流取消时不再发起查询，next_sync_at 保持不变
        if *cancel.borrow() {
            debug!(order_number = %order.number, "批次已取消，跳过查询");
            return TaskOutcome::Skipped;
        }

        let result = tokio::select! {
            biased;
            _ = cancelled(shutdown) => {
                debug!(order_number = %order.number, "停机，放弃在途查询");
                return TaskOutcome::Aborted;
            }
            result = self.gateway.order_status(&order.number) => result,
        };

        let report = match result {
            Ok(report) => report,
            Err(AccrualError::RateLimited { retry_after }) => {
                warn!(order_number = %order.number, ?retry_after, "积分服务限流，取消本批次");
                cancel.send_replace(true);
                return TaskOutcome::RateLimited;
            }
            Err(e) => {
                error!(order_number = %order.number, error = %e, "查询积分服务失败");
                return TaskOutcome::Failed;
            }
        };

        let next_sync_at = Utc::now() + self.debounce;
        let applied = if report.status == order.status {
            self.repo
                .touch_sync(&order.number, next_sync_at)
                .await
                .map(|_| TaskOutcome::Unchanged)
        } else if report.status == OrderStatus::Processed {
            let accrual = report.accrual.unwrap_or_else(|| {
                warn!(order_number = %order.number, "PROCESSED 回报缺少积分，按 0 入账");
                0
            });
            self.repo
                .apply_accrual(&order.number, accrual)
                .await
                .map(|credited| {
                    if credited {
                        metrics::record_accrual_credit(accrual);
                        info!(
                            order_number = %order.number,
                            user_id = order.user_id,
                            accrual,
                            "订单积分已入账"
                        );
                        TaskOutcome::Credited
                    } else {
                        TaskOutcome::Unchanged
                    }
                })
        } else {
            self.repo
                .update_status(&order.number, report.status, next_sync_at)
                .await
                .map(|_| {
                    info!(
                        order_number = %order.number,
                        from = %order.status,
                        to = %report.status,
                        "订单状态已更新"
                    );
                    TaskOutcome::StatusUpdated
                })
        };

        applied.unwrap_or_else(|e| {
            error!(order_number = %order.number, error = %e, "对账结果落库失败");
            TaskOutcome::Failed
        })
    }
}

/// 等待信号置位；发送端已释放且未置位时永远挂起
async fn cancelled(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|flag| *flag).await.is_err() {
        std::future::pending::<()>().await;
    }
}
