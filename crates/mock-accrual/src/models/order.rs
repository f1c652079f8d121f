//! 积分订单模型
//!
//! 未脚本化的订单每被查询一次前进一步：
//! REGISTERED -> PROCESSING -> PROCESSED（以 0 结尾的订单号为 INVALID）。

use serde::{Deserialize, Serialize};

/// 积分计算状态（外部服务词汇）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl AccrualStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

/// 积分订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualOrder {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
    /// 脚本化的订单不会自动前进
    #[serde(skip)]
    pub scripted: bool,
}

impl AccrualOrder {
    pub fn registered(number: &str) -> Self {
        Self {
            order: number.to_string(),
            status: AccrualStatus::Registered,
            accrual: None,
            scripted: false,
        }
    }

    pub fn scripted(number: &str, status: AccrualStatus, accrual: Option<f64>) -> Self {
        Self {
            order: number.to_string(),
            status,
            accrual,
            scripted: true,
        }
    }

    /// 前进一步
    pub fn advance(&mut self) {
        if self.scripted {
            return;
        }
        match self.status {
            AccrualStatus::Registered => self.status = AccrualStatus::Processing,
            AccrualStatus::Processing if self.order.ends_with('0') => {
                self.status = AccrualStatus::Invalid;
            }
            AccrualStatus::Processing => {
                self.status = AccrualStatus::Processed;
                self.accrual = Some(accrual_for(&self.order));
            }
            AccrualStatus::Invalid | AccrualStatus::Processed => {}
        }
    }
}

/// 由订单号推导积分：各位数字之和乘 10，再加末两位作为小数部分
pub fn accrual_for(number: &str) -> f64 {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();
    let sum: u32 = digits.iter().sum();
    let cents = digits
        .iter()
        .rev()
        .take(2)
        .rev()
        .fold(0, |acc, d| acc * 10 + d);
    f64::from(sum * 1000 + cents) / 100.0
}
