use market_core::payment::{GatewayReply, MerchantUid, PaymentGateway, PrepareRequest};
use market_core::CoreResult;
use std::sync::Arc;

/// Talks to the payment gateway on behalf of the order service.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Pre-register the charge for `order_id`. The merchant reference is
    /// derived from the id so the confirmation can be matched later.
    pub async fn prepare_payment(&self, order_id: i64, amount: i64) -> CoreResult<GatewayReply> {
        let request = PrepareRequest {
            merchant_uid: MerchantUid::for_order(order_id),
            amount,
        };

        tracing::debug!(merchant_uid = %request.merchant_uid, amount, "Preparing payment");
        let reply = self.gateway.prepare(&request).await?;

        if !reply.is_success() {
            tracing::warn!(
                merchant_uid = %request.merchant_uid,
                code = reply.code,
                message = reply.message.as_deref().unwrap_or(""),
                "Payment gateway rejected preparation"
            );
        }

        Ok(reply)
    }
}
