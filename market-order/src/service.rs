use market_core::webhook::{PaymentCallback, ProviderStatus};
use serde_json::Value;
use std::sync::Arc;

use crate::error::OrderError;
use crate::models::{Order, OrderStatus, PlaceOrderRequest};
use crate::orchestrator::PaymentOrchestrator;
use crate::repository::OrderRepository;

#[derive(Debug, Clone)]
pub struct OrderOptions {
    /// Mark the order `failed` when payment preparation does not succeed.
    /// When off, the order is left `pending`.
    pub compensate_on_gateway_failure: bool,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            compensate_on_gateway_failure: true,
        }
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub payment_data: Value,
}

/// Coordinates order persistence with payment preparation, and later applies
/// the payment outcome.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    payments: PaymentOrchestrator,
    options: OrderOptions,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, payments: PaymentOrchestrator, options: OrderOptions) -> Self {
        Self {
            repo,
            payments,
            options,
        }
    }

    /// Validate, insert a `pending` order, then prepare the payment.
    ///
    /// The insert and the gateway call are two separate steps. If the gateway
    /// rejects or cannot be reached the order row already exists; it is then
    /// marked `failed` when compensation is enabled.
    pub async fn place_order(
        &self,
        user_id: Option<i64>,
        request: PlaceOrderRequest,
    ) -> Result<PlacedOrder, OrderError> {
        let input = request.validate(user_id)?;

        let order_id = self.repo.create_order(&input.order).await?;
        tracing::info!(
            order_id,
            product_id = input.order.product_id,
            user_id = ?input.order.user_id,
            "Order created as pending"
        );

        let reply = match self.payments.prepare_payment(order_id, input.amount).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(order_id, error = %e, "Payment gateway call failed");
                self.compensate(order_id).await;
                return Err(e.into());
            }
        };

        if !reply.is_success() {
            self.compensate(order_id).await;
            return Err(OrderError::PaymentPreparationFailed {
                order_id,
                payload: reply.raw,
            });
        }

        Ok(PlacedOrder {
            order_id,
            payment_data: reply.response,
        })
    }

    /// Set the status of an existing order. The status string must name a
    /// known [`OrderStatus`]; no transition rules apply.
    pub async fn complete_order(&self, order_id: i64, status: &str) -> Result<OrderStatus, OrderError> {
        let status: OrderStatus = status.parse()?;
        self.set_status(order_id, status).await?;
        Ok(status)
    }

    /// Apply a verified provider callback. Returns the new status, or `None`
    /// when the provider status carries no order transition.
    pub async fn apply_payment_callback(
        &self,
        callback: &PaymentCallback,
    ) -> Result<Option<OrderStatus>, OrderError> {
        let order_id = callback
            .merchant_uid
            .order_id()
            .ok_or(OrderError::MissingField)?;

        let status = match callback.status {
            ProviderStatus::Paid => OrderStatus::Paid,
            ProviderStatus::Failed => OrderStatus::Failed,
            ProviderStatus::Cancelled => OrderStatus::Cancelled,
            ProviderStatus::Ready | ProviderStatus::Unknown => {
                tracing::debug!(order_id, status = ?callback.status, "Callback without order transition");
                return Ok(None);
            }
        };

        self.set_status(order_id, status).await?;
        tracing::info!(order_id, imp_uid = ?callback.imp_uid, %status, "Order updated from payment callback");
        Ok(Some(status))
    }

    pub async fn get_order(&self, order_id: i64) -> Result<Order, OrderError> {
        self.repo
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    /// Fetch an order on behalf of `user_id`. Guest orders have no owner and
    /// are reported as not found.
    pub async fn get_order_for(&self, order_id: i64, user_id: i64) -> Result<Order, OrderError> {
        let order = self.get_order(order_id).await?;
        match order.user_id {
            Some(owner) if owner == user_id => Ok(order),
            Some(_) => Err(OrderError::Forbidden(order_id)),
            None => Err(OrderError::NotFound(order_id)),
        }
    }

    pub async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>, OrderError> {
        self.repo.list_orders(user_id).await
    }

    async fn set_status(&self, order_id: i64, status: OrderStatus) -> Result<(), OrderError> {
        if !self.repo.update_order_status(order_id, status).await? {
            return Err(OrderError::NotFound(order_id));
        }
        tracing::info!(order_id, %status, "Order status updated");
        Ok(())
    }

    async fn compensate(&self, order_id: i64) {
        if !self.options.compensate_on_gateway_failure {
            tracing::warn!(order_id, "Payment preparation failed, order left pending");
            return;
        }

        match self.repo.update_order_status(order_id, OrderStatus::Failed).await {
            Ok(_) => tracing::warn!(order_id, "Payment preparation failed, order marked failed"),
            Err(e) => tracing::error!(order_id, error = %e, "Could not mark order failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryOrderRepository;
    use market_core::payment::{MerchantUid, MockPaymentGateway};

    fn request() -> PlaceOrderRequest {
        PlaceOrderRequest {
            product_id: Some(1),
            reservation_date: Some("2025-07-12".to_string()),
            reservation_time: Some("11:30".to_string()),
            customer_name: Some("Park Jisoo".to_string()),
            contact_phone: Some("010-2222-3333".to_string()),
            contact_email: Some("jisoo@example.com".to_string()),
            address: Some("Busan, Haeundae-gu 5".to_string()),
            amount: Some(15000),
        }
    }

    fn service(
        gateway: Arc<MockPaymentGateway>,
        compensate: bool,
    ) -> (OrderService, Arc<InMemoryOrderRepository>) {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let svc = OrderService::new(
            repo.clone(),
            PaymentOrchestrator::new(gateway),
            OrderOptions {
                compensate_on_gateway_failure: compensate,
            },
        );
        (svc, repo)
    }

    #[tokio::test]
    async fn test_place_order_success() {
        let gateway = Arc::new(MockPaymentGateway::approving());
        let (svc, repo) = service(gateway.clone(), true);

        let placed = svc.place_order(Some(4), request()).await.unwrap();
        let order = repo.get_order(placed.order_id).await.unwrap().unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.user_id, Some(4));
        assert_eq!(placed.payment_data["amount"], 15000);

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].merchant_uid, MerchantUid::for_order(placed.order_id));
        assert_eq!(calls[0].amount, 15000);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (svc, _) = service(Arc::new(MockPaymentGateway::approving()), true);
        let first = svc.place_order(None, request()).await.unwrap();
        let second = svc.place_order(None, request()).await.unwrap();
        assert_ne!(first.order_id, second.order_id);
    }

    #[tokio::test]
    async fn test_validation_has_no_side_effects() {
        let gateway = Arc::new(MockPaymentGateway::approving());
        let (svc, repo) = service(gateway.clone(), true);

        let mut req = request();
        req.contact_email = None;

        assert!(matches!(svc.place_order(None, req).await, Err(OrderError::MissingField)));
        assert!(repo.is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_leaves_pending_without_compensation() {
        let (svc, repo) = service(Arc::new(MockPaymentGateway::rejecting(1, "invalid amount")), false);

        let err = svc.place_order(None, request()).await.unwrap_err();
        let (order_id, payload) = match err {
            OrderError::PaymentPreparationFailed { order_id, payload } => (order_id, payload),
            other => panic!("expected preparation failure, got {:?}", other),
        };

        assert_eq!(payload["code"], 1);
        assert_eq!(payload["message"], "invalid amount");
        let order = repo.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_rejection_marks_failed_with_compensation() {
        let (svc, repo) = service(Arc::new(MockPaymentGateway::rejecting(-1, "denied")), true);

        let err = svc.place_order(None, request()).await.unwrap_err();
        let order_id = match err {
            OrderError::PaymentPreparationFailed { order_id, .. } => order_id,
            other => panic!("expected preparation failure, got {:?}", other),
        };

        let order = repo.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_compensates() {
        let (svc, repo) = service(Arc::new(MockPaymentGateway::unreachable()), true);

        assert!(matches!(svc.place_order(None, request()).await, Err(OrderError::Gateway(_))));
        let order = repo.get_order(1).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
    }

    #[tokio::test]
    async fn test_complete_order_last_write_wins() {
        let (svc, repo) = service(Arc::new(MockPaymentGateway::approving()), true);
        let placed = svc.place_order(None, request()).await.unwrap();

        svc.complete_order(placed.order_id, "paid").await.unwrap();
        svc.complete_order(placed.order_id, "cancelled").await.unwrap();

        let order = repo.get_order(placed.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_complete_unknown_order() {
        let (svc, repo) = service(Arc::new(MockPaymentGateway::approving()), true);
        assert!(matches!(
            svc.complete_order(9_999_999, "paid").await,
            Err(OrderError::NotFound(9_999_999))
        ));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_complete_rejects_unknown_status() {
        let (svc, repo) = service(Arc::new(MockPaymentGateway::approving()), true);
        let placed = svc.place_order(None, request()).await.unwrap();

        assert!(matches!(
            svc.complete_order(placed.order_id, "shipped").await,
            Err(OrderError::InvalidStatus(_))
        ));
        let order = repo.get_order(placed.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_payment_callback() {
        let (svc, repo) = service(Arc::new(MockPaymentGateway::approving()), true);
        let placed = svc.place_order(None, request()).await.unwrap();

        let paid = PaymentCallback {
            imp_uid: Some("imp_123".to_string()),
            merchant_uid: MerchantUid::for_order(placed.order_id),
            status: ProviderStatus::Paid,
        };
        assert_eq!(svc.apply_payment_callback(&paid).await.unwrap(), Some(OrderStatus::Paid));

        let ready = PaymentCallback {
            status: ProviderStatus::Ready,
            ..paid.clone()
        };
        assert_eq!(svc.apply_payment_callback(&ready).await.unwrap(), None);

        let order = repo.get_order(placed.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_order_ownership() {
        let (svc, _) = service(Arc::new(MockPaymentGateway::approving()), true);
        let mine = svc.place_order(Some(1), request()).await.unwrap();
        let guest = svc.place_order(None, request()).await.unwrap();

        assert!(svc.get_order_for(mine.order_id, 1).await.is_ok());
        assert!(matches!(
            svc.get_order_for(mine.order_id, 2).await,
            Err(OrderError::Forbidden(_))
        ));
        assert!(matches!(
            svc.get_order_for(guest.order_id, 2).await,
            Err(OrderError::NotFound(_))
        ));
        assert_eq!(svc.list_orders(1).await.unwrap().len(), 1);
    }
}
