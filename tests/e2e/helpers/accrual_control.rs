//! Mock 积分计算服务的控制客户端

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::json;

/// 直接操作 Mock 积分计算服务
#[derive(Clone)]
pub struct AccrualControl {
    client: Client,
    base_url: String,
}

impl AccrualControl {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 登记订单，之后每次查询前进一步
    pub async fn register_order(&self, number: &str) -> Result<StatusCode> {
        let resp = self
            .client
            .post(format!("{}/api/orders", self.base_url))
            .json(&json!({ "order": number, "goods": [] }))
            .send()
            .await?;
        Ok(resp.status())
    }

    /// 直接设置订单状态
    pub async fn script(&self, number: &str, status: &str, accrual: Option<f64>) -> Result<()> {
        let resp = self
            .client
            .put(format!("{}/api/orders/{}", self.base_url, number))
            .json(&json!({ "status": status, "accrual": accrual }))
            .send()
            .await?;
        anyhow::ensure!(resp.status().is_success(), "设置订单状态失败: {}", resp.status());
        Ok(())
    }
}
