//! 对账仓储
//!
//! 供对账 Worker 使用。状态更新只作用于仍处于 NEW/PROCESSING 的订单，
//! 终态订单不会被回退；入账与状态变更在同一事务内提交。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::balance_repo::PgBalanceRepository;
use super::traits::ReconciliationRepositoryTrait;
use crate::error::Result;
use crate::models::{OrderStatus, PendingOrder};

/// 对账仓储
pub struct PgReconciliationRepository {
    pool: PgPool,
}

impl PgReconciliationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 拉取到期的待对账订单
    pub async fn list_pending(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<PendingOrder>> {
        let orders = sqlx::query_as::<_, PendingOrder>(
            r#"
            SELECT number, user_id, status
            FROM orders
            WHERE status IN ($1, $2) AND next_sync_at <= $3
            ORDER BY next_sync_at ASC
            LIMIT $4
            "#,
        )
        .bind(OrderStatus::New)
        .bind(OrderStatus::Processing)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 推迟下次对账时间
    pub async fn touch_sync(&self, number: &str, next_sync_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET next_sync_at = $2
            WHERE number = $1 AND status IN ($3, $4)
            "#,
        )
        .bind(number)
        .bind(next_sync_at)
        .bind(OrderStatus::New)
        .bind(OrderStatus::Processing)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 更新订单状态
    pub async fn update_status(
        &self,
        number: &str,
        status: OrderStatus,
        next_sync_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, next_sync_at = $3
            WHERE number = $1 AND status IN ($4, $5)
            "#,
        )
        .bind(number)
        .bind(status)
        .bind(next_sync_at)
        .bind(OrderStatus::New)
        .bind(OrderStatus::Processing)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 标记 PROCESSED 并入账
    ///
    /// 只作用于 NEW/PROCESSING 订单：重复观察到 PROCESSED 时不会重复入账，
    /// INVALID 等终态也不会被改写。
    pub async fn apply_accrual(&self, number: &str, accrual: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = $2, accrual = $3
            WHERE number = $1 AND status IN ($4, $5)
            RETURNING user_id
            "#,
        )
        .bind(number)
        .bind(OrderStatus::Processed)
        .bind(accrual)
        .bind(OrderStatus::New)
        .bind(OrderStatus::Processing)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = owner else {
            tx.rollback().await?;
            return Ok(false);
        };

        PgBalanceRepository::credit_in_tx(&mut *tx, user_id, accrual).await?;

        tx.commit().await?;

        Ok(true)
    }
}

#[async_trait]
impl ReconciliationRepositoryTrait for PgReconciliationRepository {
    async fn list_pending(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<PendingOrder>> {
        self.list_pending(limit, now).await
    }

    async fn touch_sync(&self, number: &str, next_sync_at: DateTime<Utc>) -> Result<()> {
        self.touch_sync(number, next_sync_at).await
    }

    async fn update_status(
        &self,
        number: &str,
        status: OrderStatus,
        next_sync_at: DateTime<Utc>,
    ) -> Result<()> {
        self.update_status(number, status, next_sync_at).await
    }

    async fn apply_accrual(&self, number: &str, accrual: i64) -> Result<bool> {
        self.apply_accrual(number, accrual).await
    }
}
