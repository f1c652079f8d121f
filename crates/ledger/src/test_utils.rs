//! 测试工具模块
//!
//! 提供仓储与积分网关的内存实现，供服务层、Worker 与 HTTP 层测试使用，
//! 无需数据库和外部服务。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::accrual::{AccrualError, AccrualGateway, AccrualReport};
use crate::error::{LedgerError, Result};
use crate::models::{
    Balance, InsertOrderResult, Order, OrderStatus, PendingOrder, User, Withdrawal,
};
use crate::repository::{
    BalanceRepositoryTrait, OrderRepositoryTrait, ReconciliationRepositoryTrait,
    UserRepositoryTrait,
};

// ==================== 内存账本 ====================

#[derive(Default)]
struct LedgerState {
    users: Vec<User>,
    /// 按插入顺序保存
    orders: Vec<Order>,
    balances: HashMap<i64, Balance>,
    withdrawals: Vec<Withdrawal>,
    next_user_id: i64,
    next_withdrawal_id: i64,
    unavailable: bool,
}

impl LedgerState {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(LedgerError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn order_mut(&mut self, number: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.number == number)
    }

    fn balance_mut(&mut self, user_id: i64) -> &mut Balance {
        self.balances.entry(user_id).or_insert(Balance {
            user_id,
            current: 0,
            withdrawn: 0,
        })
    }
}

/// 内存账本
///
/// 同时实现四个仓储接口。所有操作在一把锁内完成，等价于数据库事务的原子性。
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟存储不可用，之后的所有操作返回数据库错误
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// 直接写入一个订单
    pub fn seed_order(&self, user_id: i64, number: &str, status: OrderStatus) {
        let now = Utc::now();
        self.state.lock().orders.push(Order {
            number: number.to_string(),
            user_id,
            status,
            accrual: None,
            uploaded_at: now,
            next_sync_at: now,
        });
    }

    /// 直接设置余额
    pub fn seed_balance(&self, user_id: i64, current: i64) {
        self.state.lock().balance_mut(user_id).current = current;
    }

    pub fn order(&self, number: &str) -> Option<Order> {
        self.state
            .lock()
            .orders
            .iter()
            .find(|o| o.number == number)
            .cloned()
    }

    pub fn balance_of(&self, user_id: i64) -> Balance {
        self.state
            .lock()
            .balances
            .get(&user_id)
            .copied()
            .unwrap_or(Balance {
                user_id,
                current: 0,
                withdrawn: 0,
            })
    }

    pub fn set_next_sync_at(&self, number: &str, next_sync_at: DateTime<Utc>) {
        if let Some(order) = self.state.lock().order_mut(number) {
            order.next_sync_at = next_sync_at;
        }
    }

    pub fn withdrawal_count(&self) -> usize {
        self.state.lock().withdrawals.len()
    }
}

#[async_trait]
impl OrderRepositoryTrait for MemoryLedgerStore {
    async fn insert_order(&self, user_id: i64, number: &str) -> Result<InsertOrderResult> {
        let mut state = self.state.lock();
        state.check_available()?;

        if let Some(existing) = state.orders.iter().find(|o| o.number == number) {
            return Ok(InsertOrderResult::Exists {
                owner_id: existing.user_id,
            });
        }

        let now = Utc::now();
        state.orders.push(Order {
            number: number.to_string(),
            user_id,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: now,
            next_sync_at: now,
        });
        Ok(InsertOrderResult::Inserted)
    }

    async fn list_user_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        let state = self.state.lock();
        state.check_available()?;

        // 插入顺序即上传顺序
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BalanceRepositoryTrait for MemoryLedgerStore {
    async fn withdraw(&self, user_id: i64, order_number: &str, amount: i64) -> Result<Withdrawal> {
        let mut state = self.state.lock();
        state.check_available()?;

        if state.balance_mut(user_id).current < amount {
            return Err(LedgerError::InsufficientFunds {
                user_id,
                required: amount,
            });
        }
        if state
            .withdrawals
            .iter()
            .any(|w| w.order_number == order_number)
        {
            return Err(LedgerError::DuplicateWithdrawal(order_number.to_string()));
        }

        let balance = state.balance_mut(user_id);
        balance.current -= amount;
        balance.withdrawn += amount;

        state.next_withdrawal_id += 1;
        let withdrawal = Withdrawal {
            id: state.next_withdrawal_id,
            user_id,
            order_number: order_number.to_string(),
            amount,
            processed_at: Utc::now(),
        };
        state.withdrawals.push(withdrawal.clone());
        Ok(withdrawal)
    }

    async fn balance(&self, user_id: i64) -> Result<Balance> {
        let mut state = self.state.lock();
        state.check_available()?;
        Ok(*state.balance_mut(user_id))
    }

    async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReconciliationRepositoryTrait for MemoryLedgerStore {
    async fn list_pending(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<PendingOrder>> {
        let state = self.state.lock();
        state.check_available()?;

        let mut due: Vec<&Order> = state
            .orders
            .iter()
            .filter(|o| !o.status.is_terminal() && o.next_sync_at <= now)
            .collect();
        // 稳定排序，同一时刻到期的订单保持插入顺序
        due.sort_by_key(|o| o.next_sync_at);

        Ok(due
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|o| PendingOrder {
                number: o.number.clone(),
                user_id: o.user_id,
                status: o.status,
            })
            .collect())
    }

    async fn touch_sync(&self, number: &str, next_sync_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock();
        state.check_available()?;
        if let Some(order) = state.order_mut(number).filter(|o| !o.status.is_terminal()) {
            order.next_sync_at = next_sync_at;
        }
        Ok(())
    }

    async fn update_status(
        &self,
        number: &str,
        status: OrderStatus,
        next_sync_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.check_available()?;
        if let Some(order) = state.order_mut(number).filter(|o| !o.status.is_terminal()) {
            order.status = status;
            order.next_sync_at = next_sync_at;
        }
        Ok(())
    }

    async fn apply_accrual(&self, number: &str, accrual: i64) -> Result<bool> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(order) = state
            .order_mut(number)
            .filter(|o| !o.status.is_terminal())
        else {
            return Ok(false);
        };
        order.status = OrderStatus::Processed;
        order.accrual = Some(accrual);
        let user_id = order.user_id;

        state.balance_mut(user_id).current += accrual;
        Ok(true)
    }
}

#[async_trait]
impl UserRepositoryTrait for MemoryLedgerStore {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User> {
        let mut state = self.state.lock();
        state.check_available()?;

        if state.users.iter().any(|u| u.login == login) {
            return Err(LedgerError::UserAlreadyExists(login.to_string()));
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.users.iter().find(|u| u.login == login).cloned())
    }
}

// ==================== 脚本化积分网关 ====================

/// 预设的网关回报
#[derive(Debug, Clone)]
pub enum Scripted {
    Report {
        status: OrderStatus,
        accrual: Option<i64>,
    },
    RateLimited,
    Unavailable,
}

impl Scripted {
    pub fn status(status: OrderStatus) -> Self {
        Self::Report {
            status,
            accrual: None,
        }
    }

    pub fn processed(accrual: i64) -> Self {
        Self::Report {
            status: OrderStatus::Processed,
            accrual: Some(accrual),
        }
    }
}

/// 脚本化积分网关
///
/// 每个订单号对应一组按调用顺序消费的回报，最后一个回报会一直重复；
/// 未配置的订单号回报 NEW。
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    rate_limit_at_call: Mutex<Option<usize>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次调用前等待指定时长
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn script(&self, number: &str, steps: Vec<Scripted>) {
        self.scripts
            .lock()
            .insert(number.to_string(), steps.into_iter().collect());
    }

    /// 第 `n` 次调用（从 1 开始计数）返回限流
    pub fn rate_limit_at_call(&self, n: usize) {
        *self.rate_limit_at_call.lock() = Some(n);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// 观察到的最大并发调用数
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, number: &str) -> Scripted {
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(number) {
            Some(steps) if steps.len() > 1 => steps
                .pop_front()
                .unwrap_or_else(|| Scripted::status(OrderStatus::New)),
            Some(steps) => steps
                .front()
                .cloned()
                .unwrap_or_else(|| Scripted::status(OrderStatus::New)),
            None => Scripted::status(OrderStatus::New),
        }
    }
}

#[async_trait]
impl AccrualGateway for ScriptedGateway {
    async fn order_status(&self, number: &str) -> std::result::Result<AccrualReport, AccrualError> {
        let call_no = {
            let mut calls = self.calls.lock();
            calls.push(number.to_string());
            calls.len()
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if *self.rate_limit_at_call.lock() == Some(call_no) {
            return Err(AccrualError::RateLimited {
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        match self.next_step(number) {
            Scripted::Report { status, accrual } => Ok(AccrualReport {
                number: number.to_string(),
                status,
                accrual,
            }),
            Scripted::RateLimited => Err(AccrualError::RateLimited { retry_after: None }),
            Scripted::Unavailable => Err(AccrualError::UnexpectedStatus(500)),
        }
    }
}
