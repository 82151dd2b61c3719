// HTML rendering
// Plain string templates for the landing page and each shop's pages

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use crate::shop::models::{Cart, CartItem, Order, OrderStatus, Product};
use crate::shop::{Completion, Shop, Variant};

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <link rel="stylesheet" href="/static/style.css">{head_extra}
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>"#,
        title = encode_text(title),
    )
}

fn banner(variant: Variant) -> &'static str {
    match variant {
        Variant::VulnerablePrice => {
            r#"<p class="warning">Warning: Prices can be manipulated using browser inspector!</p>"#
        }
        Variant::SecurePrice => {
            r#"<p class="success">This shop validates all prices server-side!</p>"#
        }
        Variant::VulnerableOrder => {
            r#"<p class="warning">Warning: Orders can be completed without paying!</p>"#
        }
        Variant::SecureOrder => {
            r#"<p class="success">Orders are bound to your session and complete exactly once.</p>"#
        }
    }
}

fn item_lines(items: &[CartItem], class: &str) -> String {
    let mut out = String::new();
    for item in items {
        let _ = write!(
            out,
            r#"
        <div class="{class}">
            <p>Product ID: {id} - Quantity: {qty} - Price: ${price}</p>
        </div>"#,
            id = encode_text(&item.product_id),
            qty = item.quantity,
            price = money(item.price),
        );
    }
    out
}

/// Landing page linking the four shops
pub fn home_page() -> String {
    let body = r#"        <h1>Security Demo Shopping Platform</h1>
        <p>Choose a shop to explore different security scenarios:</p>

        <div class="shop-category">
            <h2>Price Manipulation</h2>
            <div class="shop-pair">
                <a href="/vulnerable-price" class="shop-btn vulnerable">
                    <h3>Vulnerable Version</h3>
                    <p>Client-side price manipulation</p>
                </a>
                <a href="/secure-price" class="shop-btn secure">
                    <h3>Secure Version</h3>
                    <p>Server-side price validation</p>
                </a>
            </div>
        </div>

        <div class="shop-category">
            <h2>Order Processing</h2>
            <div class="shop-pair">
                <a href="/vulnerable-order" class="shop-btn vulnerable">
                    <h3>Vulnerable Version</h3>
                    <p>Order manipulation vulnerabilities</p>
                </a>
                <a href="/secure-order" class="shop-btn secure">
                    <h3>Secure Version</h3>
                    <p>Proper validation &amp; authorization</p>
                </a>
            </div>
        </div>"#;

    page("Security Demo Shop", "", body)
}

/// Catalog plus the session's cart
pub fn shop_page(shop: &Shop, products: &[Product], cart: &Cart) -> String {
    let variant = shop.variant();
    let base = variant.base_path();
    let carts = shop.carts();

    let quantity_max = carts
        .max_quantity()
        .map(|max| format!(r#" max="{max}""#))
        .unwrap_or_default();

    let mut product_html = String::new();
    for product in products {
        let price_field = if carts.pricing().accepts_client_price() {
            format!(
                r#"
                    <input type="hidden" name="price" value="{price}" id="price_{id}">"#,
                price = product.price,
                id = encode_double_quoted_attribute(&product.id),
            )
        } else {
            String::new()
        };

        let _ = write!(
            product_html,
            r#"
            <div class="product">
                <h3>{name}</h3>
                <p>Price: ${price}</p>
                <form method="POST" action="{base}/add-to-cart">
                    <input type="hidden" name="product_id" value="{id}">{price_field}
                    <input type="number" name="quantity" value="1" min="1"{quantity_max}>
                    <button type="submit">Add to Cart</button>
                </form>
            </div>"#,
            name = encode_text(&product.name),
            price = money(product.price),
            id = encode_double_quoted_attribute(&product.id),
        );
    }

    let cart_html = if cart.is_empty() {
        "            <p>Cart is empty</p>".to_string()
    } else {
        format!(
            r#"{lines}
            <p><strong>Total: ${total}</strong></p>
            <form method="POST" action="{base}/checkout">
                <button type="submit">Checkout</button>
            </form>"#,
            lines = item_lines(&cart.items, "cart-item"),
            total = money(cart.total),
        )
    };

    let body = format!(
        r#"        <h1>{title}</h1>
        {banner}

        <div class="products">
            <h2>Products</h2>{product_html}
        </div>

        <div class="cart">
            <h2>Cart</h2>
{cart_html}
        </div>

        <a href="/">Back to Home</a>"#,
        title = variant.title(),
        banner = banner(variant),
    );

    page(variant.title(), "", &body)
}

/// Card details form for a pending order
pub fn payment_page(shop: &Shop, order: &Order) -> String {
    let variant = shop.variant();
    let body = format!(
        r#"        <h1>Payment Page</h1>
        <p>Order ID: {id}</p>
        <p>Total: ${total}</p>

        <form method="POST" action="{base}/pay">
            <input type="hidden" name="order_id" value="{id_attr}">
            <h3>Payment Details</h3>
            <div>
                <label>Card Number:</label>
                <input type="text" name="card_number" placeholder="1234-5678-9012-3456" required>
            </div>
            <div>
                <label>CVV:</label>
                <input type="text" name="cvv" placeholder="123" required>
            </div>
            <button type="submit">Pay Now</button>
        </form>"#,
        id = encode_text(&order.id),
        id_attr = encode_double_quoted_attribute(&order.id),
        total = money(order.total),
        base = variant.base_path(),
    );

    page(&format!("Payment - {}", variant.title()), "", &body)
}

/// Auto-submitting confirmation page
pub fn confirm_page(shop: &Shop, order: &Order) -> String {
    let variant = shop.variant();
    let script = r#"
    <script>
        let countdown = 3;
        function updateCountdown() {
            document.getElementById('countdown').textContent = countdown;
            if (countdown <= 0) {
                document.getElementById('confirmForm').submit();
            } else {
                countdown--;
                setTimeout(updateCountdown, 1000);
            }
        }
        window.onload = function() {
            updateCountdown();
        };
    </script>"#;

    let body = format!(
        r#"        <h1>Confirm Your Payment</h1>
        <p>Order ID: {id}</p>
        <p>Total: ${total}</p>
        <p>Payment processed. Order will be confirmed in <span id="countdown">3</span> seconds...</p>

        <form id="confirmForm" method="POST" action="{base}/confirm">
            <input type="hidden" name="order_id" value="{id_attr}">
            <button type="submit">Confirm Now</button>
        </form>"#,
        id = encode_text(&order.id),
        id_attr = encode_double_quoted_attribute(&order.id),
        total = money(order.total),
        base = variant.base_path(),
    );

    page("Confirm Payment", script, &body)
}

/// Order outcome
pub fn result_page(shop: &Shop, order: &Order) -> String {
    let variant = shop.variant();

    let pending_note = match (order.status, shop.completion()) {
        (OrderStatus::Pending, Completion::Deferred(_)) => {
            "\n        <p><em>Order will be completed in a few seconds after payment...</em></p>"
        }
        _ => "",
    };

    let body = format!(
        r#"        <h1>Order {heading}</h1>
        <p>Order ID: {id}</p>
        <p>Status: <span class="status">{status}</span></p>{pending_note}
        <p>Total: ${total}</p>
        <p>Date: {date}</p>

        <h3>Items:</h3>{items}

        <a href="{base}">Back to Shop</a>
        <a href="/">Home</a>"#,
        heading = match order.status {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Complete",
        },
        id = encode_text(&order.id),
        status = order.status,
        total = money(order.total),
        date = order.created_at.format("%Y-%m-%d %H:%M:%S"),
        items = item_lines(&order.items, "order-item"),
        base = variant.base_path(),
    );

    page(&format!("Order Result - {}", variant.title()), "", &body)
}
