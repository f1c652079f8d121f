//! 订单提交服务
//!
//! 处理用户提交的订单号：
//! 1. 本地校验（去空白、纯数字、Luhn），不涉及 I/O
//! 2. 以 NEW 状态登记，依赖唯一约束判重
//! 3. 冲突时按归属区分幂等重复提交与他人订单
//!
//! 存储层的其他错误原样返回，由调用方在传输层决定是否重试。

use std::sync::Arc;

use gophermart_shared::observability::metrics;
use tracing::{error, info, instrument, warn};

use crate::error::{LedgerError, Result};
use crate::luhn::normalize_order_number;
use crate::models::{InsertOrderResult, Order};
use crate::repository::OrderRepositoryTrait;

/// 订单提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 新订单已受理
    Accepted,
    /// 同一用户重复提交，视为成功
    AlreadyOwnedBySameUser,
}

/// 订单提交服务
pub struct OrderIntakeService {
    orders: Arc<dyn OrderRepositoryTrait>,
}

impl OrderIntakeService {
    pub fn new(orders: Arc<dyn OrderRepositoryTrait>) -> Self {
        Self { orders }
    }

    /// 提交订单号
    #[instrument(skip(self))]
    pub async fn submit(&self, user_id: i64, raw_number: &str) -> Result<SubmitOutcome> {
        let Some(number) = normalize_order_number(raw_number) else {
            metrics::record_order_submission("invalid_format");
            return Err(LedgerError::InvalidOrderNumber);
        };

        match self.orders.insert_order(user_id, &number).await {
            Ok(InsertOrderResult::Inserted) => {
                metrics::record_order_submission("accepted");
                info!(order_number = %number, "订单已受理");
                Ok(SubmitOutcome::Accepted)
            }
            Ok(InsertOrderResult::Exists { owner_id }) if owner_id == user_id => {
                metrics::record_order_submission("already_owned");
                Ok(SubmitOutcome::AlreadyOwnedBySameUser)
            }
            Ok(InsertOrderResult::Exists { owner_id }) => {
                metrics::record_order_submission("another_user");
                warn!(order_number = %number, owner_id, "订单号已被其他用户提交");
                Err(LedgerError::AnotherUserOrder(number))
            }
            Err(e) => {
                metrics::record_order_submission("error");
                error!(order_number = %number, error = %e, "登记订单失败");
                Err(e)
            }
        }
    }

    /// 查询用户的订单列表
    pub async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        self.orders.list_user_orders(user_id).await
    }
}
