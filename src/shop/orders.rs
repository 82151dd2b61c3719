// Order lifecycle
// Ownership and transition rules, confirmation, and the deferred payment-gateway completion

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{ShopError, ShopResult};
use super::models::{CartItem, Order, OrderStatus};
use super::session::generate_token;
use crate::store::OrderMap;

/// Card fields submitted on the payment form
#[derive(Debug, Clone, Default)]
pub struct PaymentDetails {
    pub card_number: String,
    pub cvv: String,
}

impl PaymentDetails {
    pub fn is_complete(&self) -> bool {
        !self.card_number.trim().is_empty() && !self.cvv.trim().is_empty()
    }
}

/// Who may see an order and when it may be completed
pub trait OrderPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// May `requester` (a user id) view or act on `order`?
    fn authorize(&self, order: &Order, requester: &str) -> ShopResult<()>;

    /// May `order` move to completed right now?
    fn check_transition(&self, order: &Order) -> ShopResult<()>;

    /// Validate submitted payment details
    fn check_payment(&self, details: &PaymentDetails) -> ShopResult<()>;

    /// Whether the pay step looks at the order at all
    fn guards_payment(&self) -> bool;
}

/// Anyone holding an order id may view it and complete it, repeatedly
pub struct OpenOrders;

impl OrderPolicy for OpenOrders {
    fn name(&self) -> &'static str {
        "open"
    }

    fn authorize(&self, order: &Order, requester: &str) -> ShopResult<()> {
        if order.user_id != requester {
            warn!(order_id = %order.id, "Serving order to a session that does not own it");
        }
        Ok(())
    }

    fn check_transition(&self, order: &Order) -> ShopResult<()> {
        if order.status == OrderStatus::Completed {
            warn!(order_id = %order.id, "Completing an order that was already completed");
        }
        Ok(())
    }

    fn check_payment(&self, _details: &PaymentDetails) -> ShopResult<()> {
        Ok(())
    }

    fn guards_payment(&self) -> bool {
        false
    }
}

/// Orders are bound to the session user that placed them and complete exactly once
pub struct OwnerBoundOrders;

impl OrderPolicy for OwnerBoundOrders {
    fn name(&self) -> &'static str {
        "owner-bound"
    }

    fn authorize(&self, order: &Order, requester: &str) -> ShopResult<()> {
        if order.user_id == requester {
            Ok(())
        } else {
            Err(ShopError::Unauthorized(order.id.clone()))
        }
    }

    fn check_transition(&self, order: &Order) -> ShopResult<()> {
        match order.status {
            OrderStatus::Pending => Ok(()),
            OrderStatus::Completed => Err(ShopError::AlreadyProcessed(order.id.clone())),
        }
    }

    fn check_payment(&self, details: &PaymentDetails) -> ShopResult<()> {
        if details.is_complete() {
            Ok(())
        } else {
            Err(ShopError::IncompletePayment)
        }
    }

    fn guards_payment(&self) -> bool {
        true
    }
}

/// Order operations for one shop variant
#[derive(Clone)]
pub struct OrderService {
    orders: OrderMap,
    policy: Arc<dyn OrderPolicy>,
}

impl OrderService {
    pub fn new(orders: OrderMap, policy: Arc<dyn OrderPolicy>) -> Self {
        Self { orders, policy }
    }

    pub fn policy(&self) -> &dyn OrderPolicy {
        self.policy.as_ref()
    }

    /// Store a new pending order
    pub fn create(&self, user_id: &str, items: Vec<CartItem>, total: f64) -> Order {
        let order = Order {
            id: generate_token(),
            user_id: user_id.to_string(),
            items,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        self.orders.set(order.id.clone(), order.clone());

        info!(order_id = %order.id, total = order.total, "Order created");
        order
    }

    pub fn get(&self, order_id: &str) -> ShopResult<Order> {
        self.orders
            .get(&order_id.to_string())
            .ok_or_else(|| ShopError::OrderNotFound(order_id.to_string()))
    }

    /// Fetch an order on behalf of `requester`
    pub fn view(&self, order_id: &str, requester: &str) -> ShopResult<Order> {
        let order = self.get(order_id)?;
        self.policy.authorize(&order, requester)?;
        Ok(order)
    }

    /// Check that `requester` may pay for the order now
    pub fn authorize_payment(
        &self,
        order_id: &str,
        requester: &str,
        details: &PaymentDetails,
    ) -> ShopResult<Order> {
        let order = self.view(order_id, requester)?;
        self.policy.check_transition(&order)?;
        self.policy.check_payment(details)?;
        Ok(order)
    }

    /// Complete an order on behalf of `requester`.
    ///
    /// The policy checks and the status write run under one store lock, so two
    /// concurrent confirmations cannot both observe `pending`.
    pub fn confirm(&self, order_id: &str, requester: &str) -> ShopResult<Order> {
        let policy = self.policy.as_ref();
        self.transition(order_id, &mut |order| {
            policy.authorize(order, requester)?;
            policy.check_transition(order)
        })
    }

    /// Complete an order that is still pending, without an ownership check.
    /// Used by the payment gateway path, which acts for the system rather than a session.
    pub fn complete_pending(&self, order_id: &str) -> ShopResult<Order> {
        self.transition(order_id, &mut |order| match order.status {
            OrderStatus::Pending => Ok(()),
            OrderStatus::Completed => Err(ShopError::AlreadyProcessed(order.id.clone())),
        })
    }

    /// Complete the order after `delay`, unless `cancel` fires first.
    /// Failures are logged and dropped; the task is never retried.
    pub fn schedule_completion(
        &self,
        order_id: String,
        delay: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let orders = self.clone();

        debug!(order_id = %order_id, delay_ms = delay.as_millis() as u64, "Completion scheduled");

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(order_id = %order_id, "Scheduled completion cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    match orders.complete_pending(&order_id) {
                        Ok(_) => info!(order_id = %order_id, "Payment confirmed by gateway"),
                        Err(e) => debug!(
                            order_id = %order_id,
                            error = %e,
                            "Scheduled completion skipped"
                        ),
                    }
                }
            }
        })
    }

    fn transition(
        &self,
        order_id: &str,
        check: &mut dyn FnMut(&Order) -> ShopResult<()>,
    ) -> ShopResult<Order> {
        let mut outcome = None;
        let found = self.orders.modify(&order_id.to_string(), &mut |order| {
            outcome = Some(check(&*order).map(|_| {
                order.status = OrderStatus::Completed;
                order.clone()
            }));
        });

        if !found {
            return Err(ShopError::OrderNotFound(order_id.to_string()));
        }

        let order = outcome.unwrap_or_else(|| Err(ShopError::OrderNotFound(order_id.to_string())))?;
        info!(order_id = %order.id, policy = self.policy.name(), "Order completed");
        Ok(order)
    }
}
