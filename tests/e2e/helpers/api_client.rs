//! REST API 客户端
//!
//! 封装对积分商城服务的 HTTP 调用，注册/登录成功后自动携带 Token。

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// 订单
#[derive(Debug, Clone, Deserialize)]
pub struct OrderView {
    pub number: String,
    pub status: String,
    pub accrual: Option<f64>,
    pub uploaded_at: String,
}

/// 余额
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BalanceView {
    pub current: f64,
    pub withdrawn: f64,
}

/// 提现记录
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalView {
    pub order: String,
    pub sum: f64,
    pub processed_at: String,
}

/// API 客户端
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("创建 HTTP 客户端失败");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // ========== 用户 API ==========

    pub async fn register(&mut self, login: &str, password: &str) -> Result<StatusCode> {
        self.authenticate("/api/user/register", login, password).await
    }

    pub async fn login(&mut self, login: &str, password: &str) -> Result<StatusCode> {
        self.authenticate("/api/user/login", login, password).await
    }

    async fn authenticate(&mut self, path: &str, login: &str, password: &str) -> Result<StatusCode> {
        let resp = self
            .client
            .post(self.url(path))
            .json(&json!({ "login": login, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::OK {
            let bearer = resp
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .context("响应中缺少 Authorization 头")?;
            self.token = Some(bearer.to_string());
        }
        Ok(status)
    }

    // ========== 订单 API ==========

    pub async fn submit_order(&self, number: &str) -> Result<StatusCode> {
        let resp = self
            .authed(self.client.post(self.url("/api/user/orders")))
            .header(header::CONTENT_TYPE, "text/plain")
            .body(number.to_string())
            .send()
            .await?;
        Ok(resp.status())
    }

    /// 订单列表；204 时返回空列表
    pub async fn orders(&self) -> Result<(StatusCode, Vec<OrderView>)> {
        let resp = self
            .authed(self.client.get(self.url("/api/user/orders")))
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Ok((status, Vec::new()));
        }
        Ok((status, resp.json().await?))
    }

    pub async fn order(&self, number: &str) -> Result<Option<OrderView>> {
        let (_, orders) = self.orders().await?;
        Ok(orders.into_iter().find(|o| o.number == number))
    }

    // ========== 余额 API ==========

    pub async fn balance(&self) -> Result<BalanceView> {
        let resp = self
            .authed(self.client.get(self.url("/api/user/balance")))
            .send()
            .await?;
        anyhow::ensure!(resp.status() == StatusCode::OK, "查询余额失败: {}", resp.status());
        Ok(resp.json().await?)
    }

    pub async fn withdraw(&self, order: &str, sum: f64) -> Result<StatusCode> {
        let resp = self
            .authed(self.client.post(self.url("/api/user/balance/withdraw")))
            .json(&json!({ "order": order, "sum": sum }))
            .send()
            .await?;
        Ok(resp.status())
    }

    /// 提现记录；204 时返回空列表
    pub async fn withdrawals(&self) -> Result<(StatusCode, Vec<WithdrawalView>)> {
        let resp = self
            .authed(self.client.get(self.url("/api/user/withdrawals")))
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Ok((status, Vec::new()));
        }
        Ok((status, resp.json().await?))
    }

    // ========== 探针 ==========

    pub async fn health(&self) -> Result<StatusCode> {
        Ok(self.client.get(self.url("/health")).send().await?.status())
    }
}
