//! 订单仓储
//!
//! 订单号是主键，首次成功插入的用户即为订单归属，之后不可变更。

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::OrderRepositoryTrait;
use crate::error::{Result, is_unique_violation};
use crate::models::{InsertOrderResult, Order, OrderStatus};

/// 订单仓储
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 登记新订单
    ///
    /// 依赖主键约束判重：冲突时回读现有归属用户，由服务层判断是否为幂等重复提交。
    pub async fn insert_order(&self, user_id: i64, number: &str) -> Result<InsertOrderResult> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (number, user_id, status, uploaded_at, next_sync_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            "#,
        )
        .bind(number)
        .bind(user_id)
        .bind(OrderStatus::New)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(InsertOrderResult::Inserted),
            Err(e) if is_unique_violation(&e) => {
                let owner_id: i64 =
                    sqlx::query_scalar("SELECT user_id FROM orders WHERE number = $1")
                        .bind(number)
                        .fetch_one(&self.pool)
                        .await?;
                Ok(InsertOrderResult::Exists { owner_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 列出用户订单
    pub async fn list_user_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT number, user_id, status, accrual, uploaded_at, next_sync_at
            FROM orders
            WHERE user_id = $1
            ORDER BY uploaded_at ASC, number ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

#[async_trait]
impl OrderRepositoryTrait for PgOrderRepository {
    async fn insert_order(&self, user_id: i64, number: &str) -> Result<InsertOrderResult> {
        self.insert_order(user_id, number).await
    }

    async fn list_user_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        self.list_user_orders(user_id).await
    }
}
