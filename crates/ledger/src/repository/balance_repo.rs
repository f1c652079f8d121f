//! 余额与提现仓储
//!
//! 扣款采用单条条件更新（`current >= amount`），不做先读后写，
//! 同一用户的并发提现由数据库行锁串行化。

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use super::traits::BalanceRepositoryTrait;
use crate::error::{LedgerError, Result, is_unique_violation};
use crate::models::{Balance, Withdrawal};

/// 余额与提现仓储
pub struct PgBalanceRepository {
    pool: PgPool,
}

impl PgBalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中确保余额行存在
    pub async fn ensure_balance_in_tx(conn: &mut PgConnection, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO balances (user_id, current, withdrawn)
            VALUES ($1, 0, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// 在事务中为用户入账
    pub async fn credit_in_tx(conn: &mut PgConnection, user_id: i64, amount: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO balances (user_id, current, withdrawn)
            VALUES ($1, $2, 0)
            ON CONFLICT (user_id) DO UPDATE SET current = balances.current + EXCLUDED.current
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// 提现
    ///
    /// 1. 确保余额行存在
    /// 2. 条件扣款，未命中即余额不足
    /// 3. 写入提现记录，订单号冲突则整体回滚
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        amount: i64,
    ) -> Result<Withdrawal> {
        let mut tx = self.pool.begin().await?;

        Self::ensure_balance_in_tx(&mut *tx, user_id).await?;

        let debited = sqlx::query(
            r#"
            UPDATE balances
            SET current = current - $2, withdrawn = withdrawn + $2
            WHERE user_id = $1 AND current >= $2
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if debited == 0 {
            tx.rollback().await?;
            return Err(LedgerError::InsufficientFunds {
                user_id,
                required: amount,
            });
        }

        let inserted = sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals (user_id, order_number, amount, processed_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, user_id, order_number, amount, processed_at
            "#,
        )
        .bind(user_id)
        .bind(order_number)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(withdrawal) => {
                tx.commit().await?;
                Ok(withdrawal)
            }
            Err(e) if is_unique_violation(&e) => {
                debug!(user_id, order_number, "提现订单号重复，回滚扣款");
                tx.rollback().await?;
                Err(LedgerError::DuplicateWithdrawal(order_number.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 查询余额
    ///
    /// upsert 与读取放在同一事务，避免与并发的首次写入竞争。
    pub async fn balance(&self, user_id: i64) -> Result<Balance> {
        let mut tx = self.pool.begin().await?;

        Self::ensure_balance_in_tx(&mut *tx, user_id).await?;

        let balance = sqlx::query_as::<_, Balance>(
            "SELECT user_id, current, withdrawn FROM balances WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(balance)
    }

    /// 列出提现记录
    pub async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, user_id, order_number, amount, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(withdrawals)
    }
}

#[async_trait]
impl BalanceRepositoryTrait for PgBalanceRepository {
    async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        amount: i64,
    ) -> Result<Withdrawal> {
        self.withdraw(user_id, order_number, amount).await
    }

    async fn balance(&self, user_id: i64) -> Result<Balance> {
        self.balance(user_id).await
    }

    async fn list_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        self.list_withdrawals(user_id).await
    }
}
