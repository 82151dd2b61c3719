// Cart management
// Line pricing strategies and the add-to-cart / checkout-snapshot operations built on them

use std::sync::Arc;
use tracing::{debug, warn};

use super::catalog::Catalog;
use super::error::{ShopError, ShopResult};
use super::models::{Cart, CartItem, Product};
use crate::store::CartMap;

/// How a shop prices cart lines and totals.
///
/// The vulnerable and secure shops differ only in which implementation they hold.
pub trait PricePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the add-to-cart form carries a price field
    fn accepts_client_price(&self) -> bool;

    /// Unit price recorded for a newly added line
    fn line_price(&self, product: &Product, client_price: Option<f64>) -> f64;

    /// Recompute the cart total, possibly rewriting line prices
    fn reprice(&self, catalog: &Catalog, items: &mut Vec<CartItem>) -> f64;

    /// Lines and total an order is created with
    fn checkout_snapshot(&self, catalog: &Catalog, cart: &Cart) -> (Vec<CartItem>, f64);
}

/// Records whatever price the browser submitted and sums it as-is
pub struct ClientTrustedPricing;

impl PricePolicy for ClientTrustedPricing {
    fn name(&self) -> &'static str {
        "client-trusted"
    }

    fn accepts_client_price(&self) -> bool {
        true
    }

    fn line_price(&self, product: &Product, client_price: Option<f64>) -> f64 {
        let price = client_price.unwrap_or(0.0);
        if price != product.price {
            warn!(
                product_id = %product.id,
                catalog_price = product.price,
                client_price = price,
                "Accepting client-supplied price"
            );
        }
        price
    }

    fn reprice(&self, _catalog: &Catalog, items: &mut Vec<CartItem>) -> f64 {
        sum_lines(items)
    }

    fn checkout_snapshot(&self, _catalog: &Catalog, cart: &Cart) -> (Vec<CartItem>, f64) {
        (cart.items.clone(), cart.total)
    }
}

/// Prices every line from the catalog, ignoring anything the client sends
pub struct CatalogPricing {
    revalidate_at_checkout: bool,
}

impl CatalogPricing {
    /// Catalog prices everywhere, including a fresh lookup at checkout
    pub fn strict() -> Self {
        Self {
            revalidate_at_checkout: true,
        }
    }

    /// Catalog prices in the cart, but checkout charges the cached cart total
    pub fn trusting_cached_total() -> Self {
        Self {
            revalidate_at_checkout: false,
        }
    }
}

impl PricePolicy for CatalogPricing {
    fn name(&self) -> &'static str {
        if self.revalidate_at_checkout {
            "catalog"
        } else {
            "catalog-cached-total"
        }
    }

    fn accepts_client_price(&self) -> bool {
        false
    }

    fn line_price(&self, product: &Product, _client_price: Option<f64>) -> f64 {
        product.price
    }

    fn reprice(&self, catalog: &Catalog, items: &mut Vec<CartItem>) -> f64 {
        items.retain_mut(|item| match catalog.price_of(&item.product_id) {
            Some(price) => {
                item.price = price;
                true
            }
            None => {
                debug!(product_id = %item.product_id, "Dropping line for unknown product");
                false
            }
        });
        sum_lines(items)
    }

    fn checkout_snapshot(&self, catalog: &Catalog, cart: &Cart) -> (Vec<CartItem>, f64) {
        if !self.revalidate_at_checkout {
            return (cart.items.clone(), cart.total);
        }

        let mut items = cart.items.clone();
        let total = self.reprice(catalog, &mut items);
        (items, total)
    }
}

fn sum_lines(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}

/// Cart operations for one shop variant
#[derive(Clone)]
pub struct CartService {
    carts: CartMap,
    catalog: Catalog,
    pricing: Arc<dyn PricePolicy>,

    /// Largest quantity a single add may request, if capped
    max_quantity: Option<u32>,
}

impl CartService {
    pub fn new(
        carts: CartMap,
        catalog: Catalog,
        pricing: Arc<dyn PricePolicy>,
        max_quantity: Option<u32>,
    ) -> Self {
        Self {
            carts,
            catalog,
            pricing,
            max_quantity,
        }
    }

    pub fn pricing(&self) -> &dyn PricePolicy {
        self.pricing.as_ref()
    }

    pub fn max_quantity(&self) -> Option<u32> {
        self.max_quantity
    }

    /// Current cart, or an empty one. Reading never persists anything.
    pub fn cart(&self, session_id: &str) -> Cart {
        self.carts.get(&session_id.to_string()).unwrap_or_default()
    }

    /// Append a line and recompute the total under this shop's price policy
    pub fn add_item(
        &self,
        session_id: &str,
        product_id: &str,
        quantity: i64,
        client_price: Option<f64>,
    ) -> ShopResult<Cart> {
        let quantity = self.validate_quantity(quantity)?;

        let product = self
            .catalog
            .get_product(product_id)
            .ok_or_else(|| ShopError::UnknownProduct(product_id.to_string()))?;

        let mut cart = self.cart(session_id);
        cart.items.push(CartItem {
            product_id: product.id.clone(),
            quantity,
            price: self.pricing.line_price(&product, client_price),
        });
        cart.total = self.pricing.reprice(&self.catalog, &mut cart.items);

        self.carts.set(session_id.to_string(), cart.clone());

        debug!(
            session_id = %session_id,
            product_id = %product_id,
            quantity = quantity,
            total = cart.total,
            pricing = self.pricing.name(),
            "Cart updated"
        );

        Ok(cart)
    }

    /// Lines and total to create an order with
    pub fn checkout_snapshot(&self, cart: &Cart) -> ShopResult<(Vec<CartItem>, f64)> {
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }
        Ok(self.pricing.checkout_snapshot(&self.catalog, cart))
    }

    pub fn clear(&self, session_id: &str) {
        self.carts.delete(&session_id.to_string());
    }

    fn validate_quantity(&self, quantity: i64) -> ShopResult<u64> {
        let accepted = u64::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .filter(|q| self.max_quantity.map_or(true, |max| *q <= u64::from(max)));

        accepted.ok_or(ShopError::InvalidQuantity(quantity))
    }
}
