//! 积分计算服务 HTTP 客户端
//!
//! `GET {base}/api/orders/{number}`：
//! - 200：JSON `{order, status, accrual?}`
//! - 204：服务尚未登记该订单，视为 NEW
//! - 429：限流，`Retry-After` 仅记录日志
//! - 其他：异常状态码

use std::time::{Duration, Instant};

use async_trait::async_trait;
use gophermart_shared::config::AccrualConfig;
use gophermart_shared::observability::metrics;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{AccrualError, AccrualGateway, AccrualReport, map_status};
use crate::models::OrderStatus;
use crate::money::to_minor_units;

/// 积分服务响应体
#[derive(Debug, Deserialize)]
struct AccrualResponse {
    order: String,
    status: String,
    #[serde(default)]
    accrual: Option<f64>,
}

/// 积分计算服务 HTTP 客户端
pub struct AccrualHttpClient {
    client: Client,
    base_url: String,
}

impl AccrualHttpClient {
    pub fn new(config: &AccrualConfig) -> Result<Self, AccrualError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, number: &str) -> Result<AccrualReport, AccrualError> {
        let url = format!("{}/api/orders/{}", self.base_url, number);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => {
                let body: AccrualResponse = response
                    .json()
                    .await
                    .map_err(|e| AccrualError::InvalidPayload(e.to_string()))?;
                into_report(body)
            }
            StatusCode::NO_CONTENT => Ok(AccrualReport {
                number: number.to_string(),
                status: OrderStatus::New,
                accrual: None,
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                warn!(order_number = %number, ?retry_after, "积分服务限流");
                Err(AccrualError::RateLimited { retry_after })
            }
            status => Err(AccrualError::UnexpectedStatus(status.as_u16())),
        }
    }
}

#[async_trait]
impl AccrualGateway for AccrualHttpClient {
    async fn order_status(&self, number: &str) -> Result<AccrualReport, AccrualError> {
        let start = Instant::now();
        let result = self.fetch(number).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(report) => {
                metrics::record_accrual_request("ok", elapsed);
                debug!(order_number = %number, status = %report.status, "积分服务回报");
            }
            Err(e) => metrics::record_accrual_request(e.outcome(), elapsed),
        }
        result
    }
}

fn into_report(body: AccrualResponse) -> Result<AccrualReport, AccrualError> {
    let status = map_status(&body.status)?;
    let accrual = match body.accrual {
        Some(value) if value < 0.0 => {
            return Err(AccrualError::InvalidPayload(format!(
                "积分为负数: {}",
                value
            )));
        }
        Some(value) => Some(to_minor_units(value).ok_or_else(|| {
            AccrualError::InvalidPayload(format!("积分无法表示: {}", value))
        })?),
        None => None,
    };

    Ok(AccrualReport {
        number: body.order,
        status,
        accrual,
    })
}

/// 补全协议头并去掉末尾的 `/`
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
