use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Mutex;

use crate::{CoreError, CoreResult};

const MERCHANT_UID_PREFIX: &str = "order_";

/// Merchant-side reference handed to the gateway, derived from the order id
/// so a later payment confirmation can be correlated back to the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantUid(String);

impl MerchantUid {
    pub fn for_order(order_id: i64) -> Self {
        Self(format!("{}{}", MERCHANT_UID_PREFIX, order_id))
    }

    /// Recover the order id. Anything not shaped like `order_<id>` is rejected.
    pub fn order_id(&self) -> Option<i64> {
        self.0
            .strip_prefix(MERCHANT_UID_PREFIX)
            .and_then(|id| id.parse::<i64>().ok())
            .filter(|id| *id > 0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MerchantUid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MerchantUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of the gateway's `/payments/prepare` call.
#[derive(Debug, Clone, Serialize)]
pub struct PrepareRequest {
    pub merchant_uid: MerchantUid,
    pub amount: i64,
}

/// The gateway's answer. `code == 0` is success; anything else is a rejection
/// whose raw payload is kept for diagnostics.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub code: i64,
    pub message: Option<String>,
    pub response: Value,
    pub raw: Value,
}

impl GatewayReply {
    pub fn from_value(raw: Value) -> CoreResult<Self> {
        let code = raw
            .get("code")
            .and_then(Value::as_i64)
            .ok_or_else(|| CoreError::GatewayError(format!("reply without code: {}", raw)))?;
        let message = raw
            .get("message")
            .and_then(Value::as_str)
            .map(String::from);
        let response = raw.get("response").cloned().unwrap_or(Value::Null);

        Ok(Self { code, message, response, raw })
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Outbound payment gateway. Implemented over HTTP in `market-store` and by
/// [`MockPaymentGateway`] in tests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Pre-register the expected charge for a merchant reference.
    async fn prepare(&self, request: &PrepareRequest) -> CoreResult<GatewayReply>;
}

#[derive(Debug, Clone)]
enum MockBehaviour {
    Approve,
    Reject { code: i64, message: String },
    Unreachable,
}

/// In-process gateway with a fixed behaviour. Records every prepare call.
pub struct MockPaymentGateway {
    behaviour: MockBehaviour,
    calls: Mutex<Vec<PrepareRequest>>,
}

impl MockPaymentGateway {
    pub fn approving() -> Self {
        Self::with(MockBehaviour::Approve)
    }

    pub fn rejecting(code: i64, message: &str) -> Self {
        Self::with(MockBehaviour::Reject {
            code,
            message: message.to_string(),
        })
    }

    pub fn unreachable() -> Self {
        Self::with(MockBehaviour::Unreachable)
    }

    fn with(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PrepareRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn prepare(&self, request: &PrepareRequest) -> CoreResult<GatewayReply> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let raw = match &self.behaviour {
            MockBehaviour::Approve => serde_json::json!({
                "code": 0,
                "message": null,
                "response": {
                    "merchant_uid": request.merchant_uid,
                    "amount": request.amount,
                },
            }),
            MockBehaviour::Reject { code, message } => serde_json::json!({
                "code": code,
                "message": message,
                "response": null,
            }),
            MockBehaviour::Unreachable => {
                return Err(CoreError::GatewayError("connection refused".to_string()));
            }
        };

        GatewayReply::from_value(raw)
    }
}
