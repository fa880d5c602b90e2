//! 转账凭证验证中转 (EasySlip)
//!
//! 上游凭证只保存在服务端配置中，浏览器调用 `/api/easyslip`，
//! 由服务端附加 `Authorization: Bearer` 后原样转发。

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::SlipConfig;

/// 中转错误
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("slip upstream unreachable: {0}")]
    Network(String),

    #[error("slip upstream returned a non-JSON body: {0}")]
    InvalidBody(String),
}

/// 上游响应 (状态码与 JSON 原样保留)
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Value,
}

/// 支付完成后发送的凭证载荷
#[derive(Debug, Clone, Serialize)]
pub struct SlipRequest {
    pub company_id: String,
    /// RFC 3339
    pub transaction_date: String,
    pub customer_name: String,
    pub items: Vec<SlipItem>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlipItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl SlipRequest {
    /// 一次预约对应一条明细
    pub fn for_booking(
        company_id: &str,
        name: &str,
        surname: Option<&str>,
        queue_number: i64,
        amount: f64,
    ) -> Self {
        let customer_name = match surname {
            Some(surname) if !surname.is_empty() => format!("{name} {surname}"),
            _ => name.to_string(),
        };
        Self {
            company_id: company_id.to_string(),
            transaction_date: chrono::Utc::now().to_rfc3339(),
            customer_name,
            items: vec![SlipItem {
                name: format!("Queue booking #{queue_number}"),
                quantity: 1,
                price: amount,
            }],
            total_amount: amount,
        }
    }
}

/// EasySlip 中转客户端
#[derive(Clone)]
pub struct SlipRelay {
    client: Client,
    api_url: String,
    api_token: String,
}

impl std::fmt::Debug for SlipRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 不输出凭证
        f.debug_struct("SlipRelay")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl SlipRelay {
    pub fn new(config: &SlipConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RelayError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 原样转发请求体，返回上游状态码与 JSON
    pub async fn forward(&self, body: &Value) -> Result<RelayResponse, RelayError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| RelayError::InvalidBody(e.to_string()))?;

        tracing::debug!(status, "Slip relay response received");
        Ok(RelayResponse { status, body })
    }

    /// 支付完成通知，结果只记录日志
    pub async fn notify_payment(&self, reservation_id: i64, request: SlipRequest) {
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(reservation_id, error = %e, "Failed to encode slip payload");
                return;
            }
        };

        match self.forward(&body).await {
            Ok(resp) if (200..300).contains(&resp.status) => {
                tracing::info!(reservation_id, status = resp.status, "Slip verification accepted");
            }
            Ok(resp) => {
                tracing::warn!(
                    reservation_id,
                    status = resp.status,
                    body = %resp.body,
                    "Slip verification rejected"
                );
            }
            Err(e) => {
                tracing::warn!(reservation_id, error = %e, "Slip verification relay failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_payload_shape() {
        let request = SlipRequest::for_booking("20", "Ann", Some("Lee"), 4, 100.0);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["company_id"], "20");
        assert_eq!(json["customer_name"], "Ann Lee");
        assert_eq!(json["items"][0]["name"], "Queue booking #4");
        assert_eq!(json["items"][0]["quantity"], 1);
        assert_eq!(json["items"][0]["price"], 100.0);
        assert_eq!(json["total_amount"], 100.0);
        assert!(chrono::DateTime::parse_from_rfc3339(json["transaction_date"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_customer_name_without_surname() {
        let request = SlipRequest::for_booking("20", "Ann", None, 1, 50.0);
        assert_eq!(request.customer_name, "Ann");
    }

    #[test]
    fn test_debug_hides_token() {
        let relay = SlipRelay::new(&SlipConfig {
            api_url: "http://127.0.0.1:9/slips".into(),
            api_token: "super-secret".into(),
            company_id: "20".into(),
            timeout_ms: 1_000,
        })
        .unwrap();
        assert!(!format!("{relay:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        let relay = SlipRelay::new(&SlipConfig {
            api_url: "http://127.0.0.1:9/slips".into(),
            api_token: "t".into(),
            company_id: "20".into(),
            timeout_ms: 1_000,
        })
        .unwrap();
        let err = relay.forward(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, RelayError::Network(_)));
    }
}
