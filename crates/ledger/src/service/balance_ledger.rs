//! 余额账本服务
//!
//! 扣款、余额查询与提现记录查询。扣款的原子性由仓储层的单事务保证，
//! 服务层只负责参数校验与结果记录。

use std::sync::Arc;

use gophermart_shared::observability::metrics;
use tracing::{error, info, instrument};

use crate::error::{LedgerError, Result};
use crate::models::{Balance, Withdrawal};
use crate::repository::BalanceRepositoryTrait;

/// 余额账本服务
pub struct BalanceLedgerService {
    balances: Arc<dyn BalanceRepositoryTrait>,
}

impl BalanceLedgerService {
    pub fn new(balances: Arc<dyn BalanceRepositoryTrait>) -> Self {
        Self { balances }
    }

    /// 提现
    ///
    /// `amount` 为最小货币单位，必须大于 0；不合法时不触达存储。
    #[instrument(skip(self))]
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        amount: i64,
    ) -> Result<Withdrawal> {
        if amount <= 0 {
            metrics::record_withdrawal("invalid_amount");
            return Err(LedgerError::InvalidAmount);
        }

        match self.balances.withdraw(user_id, order_number, amount).await {
            Ok(withdrawal) => {
                metrics::record_withdrawal("ok");
                info!(amount, "提现成功");
                Ok(withdrawal)
            }
            Err(e) => {
                let outcome = match &e {
                    LedgerError::InsufficientFunds { .. } => "insufficient_funds",
                    LedgerError::DuplicateWithdrawal(_) => "duplicate",
                    _ => {
                        error!(error = %e, "提现失败");
                        "error"
                    }
                };
                metrics::record_withdrawal(outcome);
                Err(e)
            }
        }
    }

    /// 查询余额
    pub async fn balance(&self, user_id: i64) -> Result<Balance> {
        self.balances.balance(user_id).await
    }

    /// 查询提现记录
    pub async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        self.balances.list_withdrawals(user_id).await
    }
}
