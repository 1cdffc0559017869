use async_trait::async_trait;
use market_core::payment::{GatewayReply, PaymentGateway, PrepareRequest};
use market_core::{CoreError, CoreResult};
use serde_json::Value;
use std::time::Duration;

/// PortOne (iamport) REST client. Only the prepare call is used.
pub struct PortOneGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PortOneGateway {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CoreError::InternalError(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for PortOneGateway {
    async fn prepare(&self, request: &PrepareRequest) -> CoreResult<GatewayReply> {
        let url = format!("{}/payments/prepare", self.base_url);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CoreError::GatewayError(format!("prepare request failed: {}", e)))?;

        // Rejections come back as 4xx with the usual `{code, message}` body,
        // so the status alone is not an error here.
        let status = res.status();
        let body: Value = res.json().await.map_err(|e| {
            CoreError::GatewayError(format!("unreadable prepare reply ({}): {}", status, e))
        })?;

        tracing::debug!(%status, merchant_uid = %request.merchant_uid, "Gateway replied");
        GatewayReply::from_value(body)
    }
}
