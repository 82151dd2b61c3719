// Shop Module
// Four parallel shops built from the same stores with different trust decisions

pub mod cart;
pub mod catalog;
pub mod error;
pub mod models;
pub mod orders;
pub mod session;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ShopSettings;
use crate::store::Stores;
use cart::{CartService, CatalogPricing, ClientTrustedPricing, PricePolicy};
use catalog::Catalog;
pub use error::{ShopError, ShopResult};
use models::{Cart, Order, Session};
use orders::{OpenOrders, OrderPolicy, OrderService, OwnerBoundOrders, PaymentDetails};
use session::SessionStore;

/// The four shop variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    VulnerablePrice,
    SecurePrice,
    VulnerableOrder,
    SecureOrder,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::VulnerablePrice,
        Variant::SecurePrice,
        Variant::VulnerableOrder,
        Variant::SecureOrder,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Variant::VulnerablePrice => "vulnerable-price",
            Variant::SecurePrice => "secure-price",
            Variant::VulnerableOrder => "vulnerable-order",
            Variant::SecureOrder => "secure-order",
        }
    }

    /// Landing page path, e.g. `/secure-order`
    pub fn base_path(&self) -> String {
        format!("/{}", self.slug())
    }

    pub fn title(&self) -> &'static str {
        match self {
            Variant::VulnerablePrice => "Vulnerable Price Manipulation Shop",
            Variant::SecurePrice => "Secure Price Manipulation Shop",
            Variant::VulnerableOrder => "Vulnerable Order Processing Shop",
            Variant::SecureOrder => "Secure Order Processing Shop",
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Variant::SecurePrice | Variant::SecureOrder)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// How a paid order reaches `completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The buyer confirms on the confirmation page
    Confirm,

    /// A simulated payment gateway completes the order after a delay
    Deferred(Duration),
}

/// What the browser should see after submitting payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Continue to the confirmation page
    ConfirmNext { order_id: String },

    /// Payment handed to the gateway; show the result page while it completes
    Processing { order_id: String },
}

/// One shop variant with its policies wired to the shared stores
pub struct Shop {
    variant: Variant,
    sessions: SessionStore,
    catalog: Catalog,
    carts: CartService,
    orders: OrderService,
    completion: Completion,

    /// Cancels deferred completions on shutdown
    shutdown: CancellationToken,
}

impl Shop {
    pub fn new(
        variant: Variant,
        stores: &Stores,
        settings: &ShopSettings,
        shutdown: CancellationToken,
    ) -> Self {
        let catalog = Catalog::new(stores.products.clone());

        let (pricing, max_quantity): (Arc<dyn PricePolicy>, Option<u32>) = match variant {
            Variant::VulnerablePrice => (Arc::new(ClientTrustedPricing), None),
            Variant::VulnerableOrder => (Arc::new(CatalogPricing::trusting_cached_total()), None),
            Variant::SecurePrice | Variant::SecureOrder => (
                Arc::new(CatalogPricing::strict()),
                Some(settings.secure_max_quantity),
            ),
        };

        let order_policy: Arc<dyn OrderPolicy> = if variant.is_secure() {
            Arc::new(OwnerBoundOrders)
        } else {
            Arc::new(OpenOrders)
        };

        let completion = match variant {
            Variant::SecureOrder => {
                Completion::Deferred(Duration::from_millis(settings.payment_delay_ms))
            }
            _ => Completion::Confirm,
        };

        info!(
            variant = %variant,
            pricing = pricing.name(),
            orders = order_policy.name(),
            "Shop initialized"
        );

        Self {
            variant,
            sessions: SessionStore::new(stores.sessions.clone()),
            carts: CartService::new(stores.carts.clone(), catalog.clone(), pricing, max_quantity),
            orders: OrderService::new(stores.orders.clone(), order_policy),
            catalog,
            completion,
            shutdown,
        }
    }

    /// All four shops over one set of stores
    pub fn all(
        stores: &Stores,
        settings: &ShopSettings,
        shutdown: &CancellationToken,
    ) -> Vec<Arc<Shop>> {
        Variant::ALL
            .iter()
            .map(|variant| Arc::new(Shop::new(*variant, stores, settings, shutdown.child_token())))
            .collect()
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn carts(&self) -> &CartService {
        &self.carts
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn cart(&self, session: &Session) -> Cart {
        self.carts.cart(&session.session_id)
    }

    pub fn add_to_cart(
        &self,
        session: &Session,
        product_id: &str,
        quantity: i64,
        client_price: Option<f64>,
    ) -> ShopResult<Cart> {
        self.carts
            .add_item(&session.session_id, product_id, quantity, client_price)
    }

    /// Create a pending order from the session's cart. The cart is kept until payment.
    pub fn checkout(&self, session: &Session) -> ShopResult<Order> {
        let cart = self.carts.cart(&session.session_id);
        let (items, total) = self.carts.checkout_snapshot(&cart)?;

        let user_id = self
            .sessions
            .user_id(&session.session_id)
            .unwrap_or_else(|| session.user_id.clone());

        let order = self.orders.create(&user_id, items, total);
        info!(variant = %self.variant, order_id = %order.id, "Checkout complete");
        Ok(order)
    }

    /// Order as seen by the session, subject to this shop's ownership rule
    pub fn order_for(&self, order_id: &str, session: &Session) -> ShopResult<Order> {
        self.orders.view(order_id, &session.user_id)
    }

    /// Handle the payment form submission
    pub fn submit_payment(
        &self,
        order_id: &str,
        session: &Session,
        details: &PaymentDetails,
    ) -> ShopResult<PaymentOutcome> {
        if !self.orders.policy().guards_payment() {
            warn!(
                variant = %self.variant,
                order_id = %order_id,
                "Payment accepted without validation"
            );
            return Ok(PaymentOutcome::ConfirmNext {
                order_id: order_id.to_string(),
            });
        }

        let order = self
            .orders
            .authorize_payment(order_id, &session.user_id, details)?;

        match self.completion {
            Completion::Confirm => Ok(PaymentOutcome::ConfirmNext { order_id: order.id }),
            Completion::Deferred(delay) => {
                self.carts.clear(&session.session_id);
                self.orders
                    .schedule_completion(order.id.clone(), delay, self.shutdown.child_token());
                Ok(PaymentOutcome::Processing { order_id: order.id })
            }
        }
    }

    /// Complete the order and empty the caller's cart
    pub fn confirm(&self, order_id: &str, session: &Session) -> ShopResult<Order> {
        let order = self.orders.confirm(order_id, &session.user_id)?;
        self.carts.clear(&session.session_id);
        Ok(order)
    }
}
