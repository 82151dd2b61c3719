// Integration Tests for Secure Shop
// Drives every shop through the full HTTP router with real cookies

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use secure_shop::config::ShopConfig;
use secure_shop::web::{self, SESSION_COOKIE};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn test_app() -> Router {
    let mut config = ShopConfig::default();
    config.shop.payment_delay_ms = 100;
    web::app(&config, &CancellationToken::new())
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn fetch_page(app: &Router, uri: &str, cookie: &str) -> String {
    body_string(send(app, get(uri, cookie)).await).await
}

fn confirm_form(base: &str, cookie: &str, id: &str) -> Request<Body> {
    post(&format!("{base}/confirm"), cookie, &format!("order_id={id}"))
}

fn location(response: &Response) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

fn order_id(location: &str) -> String {
    location.split("order_id=").nth(1).unwrap().to_string()
}

/// Visit a shop without a cookie and return the `name=value` pair it issues
async fn new_session(app: &Router, base: &str) -> String {
    let request = Request::builder().uri(base).body(Body::empty()).unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Path=/"));

    let pair = set_cookie.split(';').next().unwrap().to_string();
    assert!(pair.starts_with(&format!("{SESSION_COOKIE}=")));
    pair
}

/// Add items, check out, and return the new order id
async fn place_order(app: &Router, base: &str, cookie: &str, form: &str) -> String {
    let added = send(app, post(&format!("{base}/add-to-cart"), cookie, form)).await;
    assert_eq!(added.status(), StatusCode::SEE_OTHER);

    let checkout = send(app, post(&format!("{base}/checkout"), cookie, "")).await;
    assert_eq!(checkout.status(), StatusCode::SEE_OTHER);

    let to = location(&checkout);
    assert!(to.starts_with(&format!("{base}/pay?order_id=")));
    order_id(&to)
}

#[tokio::test]
async fn test_home_and_stylesheet() {
    let app = test_app();

    let home = send(&app, get("/", "")).await;
    assert_eq!(home.status(), StatusCode::OK);
    let html = body_string(home).await;
    for base in ["/vulnerable-price", "/secure-price", "/vulnerable-order", "/secure-order"] {
        assert!(html.contains(&format!("href=\"{base}\"")));
    }

    let css = send(&app, get("/static/style.css", "")).await;
    assert_eq!(css.status(), StatusCode::OK);
    assert!(css.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/css"));
}

#[tokio::test]
async fn test_cookie_is_reused() {
    let app = test_app();
    let cookie = new_session(&app, "/secure-price").await;

    let again = send(&app, get("/secure-price", &cookie)).await;
    assert_eq!(again.status(), StatusCode::OK);
    assert!(again.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_unknown_cookie_gets_fresh_session() {
    let app = test_app();

    let response = send(&app, get("/secure-order", "session_id=forged")).await;
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(!set_cookie.starts_with("session_id=forged;"));
}

#[tokio::test]
async fn test_vulnerable_price_accepts_client_price() {
    let app = test_app();
    let base = "/vulnerable-price";
    let cookie = new_session(&app, base).await;

    let page = body_string(send(&app, get(base, &cookie)).await).await;
    assert!(page.contains(r#"name="price""#));

    let id = place_order(&app, base, &cookie, "product_id=1&quantity=1&price=0.01").await;

    let pay = fetch_page(&app, &format!("{base}/pay?order_id={id}"), &cookie).await;
    assert!(pay.contains("Total: $0.01"));
}

#[tokio::test]
async fn test_secure_price_full_flow() {
    let app = test_app();
    let base = "/secure-price";
    let cookie = new_session(&app, base).await;

    let page = body_string(send(&app, get(base, &cookie)).await).await;
    assert!(!page.contains(r#"name="price""#));

    let id = place_order(&app, base, &cookie, "product_id=1&quantity=2&price=0.01").await;

    let pay_page = send(&app, get(&format!("{base}/pay?order_id={id}"), &cookie)).await;
    assert_eq!(pay_page.status(), StatusCode::OK);
    assert!(body_string(pay_page).await.contains("Total: $1999.98"));

    let paid = send(
        &app,
        post(
            &format!("{base}/pay"),
            &cookie,
            &format!("order_id={id}&card_number=4111111111111111&cvv=123"),
        ),
    )
    .await;
    assert_eq!(paid.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&paid), format!("{base}/confirm?order_id={id}"));

    let pending = fetch_page(&app, &format!("{base}/result?order_id={id}"), &cookie).await;
    assert!(pending.contains(r#"<span class="status">pending</span>"#));

    let confirmed = send(&app, confirm_form(base, &cookie, &id)).await;
    assert_eq!(confirmed.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&confirmed), format!("{base}/result?order_id={id}"));

    let done = fetch_page(&app, &format!("{base}/result?order_id={id}"), &cookie).await;
    assert!(done.contains(r#"<span class="status">completed</span>"#));
    assert!(done.contains("Total: $1999.98"));

    let shop = body_string(send(&app, get(base, &cookie)).await).await;
    assert!(shop.contains("Cart is empty"));

    let again = send(&app, confirm_form(base, &cookie, &id)).await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_secure_quantity_cap() {
    let app = test_app();

    let secure = new_session(&app, "/secure-price").await;
    let rejected = send(
        &app,
        post("/secure-price/add-to-cart", &secure, "product_id=2&quantity=11"),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::SEE_OTHER);
    let page = body_string(send(&app, get("/secure-price", &secure)).await).await;
    assert!(page.contains("Cart is empty"));

    let vulnerable = new_session(&app, "/vulnerable-price").await;
    send(
        &app,
        post(
            "/vulnerable-price/add-to-cart",
            &vulnerable,
            "product_id=2&quantity=11&price=29.99",
        ),
    )
    .await;
    let page = body_string(send(&app, get("/vulnerable-price", &vulnerable)).await).await;
    assert!(page.contains("Quantity: 11"));
}

#[tokio::test]
async fn test_invalid_add_to_cart_redirects() {
    let app = test_app();
    let cookie = new_session(&app, "/secure-order").await;

    for form in [
        "product_id=99&quantity=1",
        "product_id=1&quantity=0",
        "product_id=1&quantity=lots",
        "",
    ] {
        let response = send(&app, post("/secure-order/add-to-cart", &cookie, form)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/secure-order");
    }

    let page = body_string(send(&app, get("/secure-order", &cookie)).await).await;
    assert!(page.contains("Cart is empty"));
}

#[tokio::test]
async fn test_wrong_method_redirects_to_shop() {
    let app = test_app();

    let response = send(&app, get("/secure-price/add-to-cart", "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/secure-price");

    let response = send(&app, get("/vulnerable-order/checkout", "")).await;
    assert_eq!(location(&response), "/vulnerable-order");
}

#[tokio::test]
async fn test_empty_cart_checkout_redirects() {
    let app = test_app();
    let cookie = new_session(&app, "/vulnerable-order").await;

    let response = send(&app, post("/vulnerable-order/checkout", &cookie, "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/vulnerable-order");
}

#[tokio::test]
async fn test_missing_and_unknown_orders() {
    let app = test_app();
    let cookie = new_session(&app, "/secure-order").await;

    let missing = send(&app, get("/secure-order/result", &cookie)).await;
    assert_eq!(missing.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&missing), "/secure-order");

    let unknown = send(&app, get("/secure-order/result?order_id=nope", &cookie)).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(unknown).await, "Order not found");
}

#[tokio::test]
async fn test_vulnerable_order_exposes_foreign_orders() {
    let app = test_app();
    let base = "/vulnerable-order";
    let owner = new_session(&app, base).await;
    let attacker = new_session(&app, base).await;

    let id = place_order(&app, base, &owner, "product_id=4&quantity=1").await;

    let viewed = send(&app, get(&format!("{base}/result?order_id={id}"), &attacker)).await;
    assert_eq!(viewed.status(), StatusCode::OK);
    assert!(body_string(viewed).await.contains("Total: $299.99"));

    // No card details, no owner check
    let paid = send(&app, post(&format!("{base}/pay"), &attacker, &format!("order_id={id}"))).await;
    assert_eq!(location(&paid), format!("{base}/confirm?order_id={id}"));

    let confirmed = send(&app, confirm_form(base, &attacker, &id)).await;
    assert_eq!(confirmed.status(), StatusCode::SEE_OTHER);

    let done = fetch_page(&app, &format!("{base}/result?order_id={id}"), &owner).await;
    assert!(done.contains(r#"<span class="status">completed</span>"#));
}

#[tokio::test]
async fn test_secure_order_rejects_foreign_session() {
    let app = test_app();
    let base = "/secure-order";
    let owner = new_session(&app, base).await;
    let attacker = new_session(&app, base).await;

    let id = place_order(&app, base, &owner, "product_id=3&quantity=1").await;

    for request in [
        get(&format!("{base}/pay?order_id={id}"), &attacker),
        get(&format!("{base}/result?order_id={id}"), &attacker),
        post(
            &format!("{base}/pay"),
            &attacker,
            &format!("order_id={id}&card_number=4111&cvv=123"),
        ),
        post(&format!("{base}/confirm"), &attacker, &format!("order_id={id}")),
    ] {
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let still_pending = fetch_page(&app, &format!("{base}/result?order_id={id}"), &owner).await;
    assert!(still_pending.contains(r#"<span class="status">pending</span>"#));
}

#[tokio::test]
async fn test_secure_order_requires_card_details() {
    let app = test_app();
    let base = "/secure-order";
    let cookie = new_session(&app, base).await;
    let id = place_order(&app, base, &cookie, "product_id=2&quantity=1").await;

    let response = send(
        &app,
        post(&format!("{base}/pay"), &cookie, &format!("order_id={id}&card_number=&cvv=")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_secure_order_deferred_completion() {
    let app = test_app();
    let base = "/secure-order";
    let cookie = new_session(&app, base).await;
    let id = place_order(&app, base, &cookie, "product_id=1&quantity=1").await;

    let paid = send(
        &app,
        post(
            &format!("{base}/pay"),
            &cookie,
            &format!("order_id={id}&card_number=4111111111111111&cvv=123"),
        ),
    )
    .await;
    assert_eq!(paid.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&paid), format!("{base}/result?order_id={id}"));

    let pending = fetch_page(&app, &format!("{base}/result?order_id={id}"), &cookie).await;
    assert!(pending.contains(r#"<span class="status">pending</span>"#));
    assert!(pending.contains("completed in a few seconds"));

    let shop = body_string(send(&app, get(base, &cookie)).await).await;
    assert!(shop.contains("Cart is empty"));

    tokio::time::sleep(Duration::from_millis(500)).await;

    let done = fetch_page(&app, &format!("{base}/result?order_id={id}"), &cookie).await;
    assert!(done.contains(r#"<span class="status">completed</span>"#));
}

#[tokio::test]
async fn test_unvalidated_pay_redirect_encodes_order_id() {
    let app = test_app();

    for base in ["/vulnerable-order", "/vulnerable-price"] {
        let cookie = new_session(&app, base).await;

        for (form_id, encoded) in [
            ("%C3%BC", "%C3%BC"),
            ("a%0D%0AX-Injected%3A%201", "a%0D%0AX-Injected%3A%201"),
        ] {
            let paid = send(
                &app,
                post(&format!("{base}/pay"), &cookie, &format!("order_id={form_id}")),
            )
            .await;
            assert_eq!(paid.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&paid), format!("{base}/confirm?order_id={encoded}"));
            assert!(paid.headers().get("x-injected").is_none());

            let confirm = send(&app, get(&location(&paid), &cookie)).await;
            assert_eq!(confirm.status(), StatusCode::NOT_FOUND);
        }
    }
}

#[tokio::test]
async fn test_repeated_secure_payment_completes_once() {
    let app = test_app();
    let base = "/secure-order";
    let cookie = new_session(&app, base).await;
    let id = place_order(&app, base, &cookie, "product_id=4&quantity=1").await;
    let card = format!("order_id={id}&card_number=4111111111111111&cvv=123");

    for _ in 0..2 {
        let paid = send(&app, post(&format!("{base}/pay"), &cookie, &card)).await;
        assert_eq!(paid.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&paid), format!("{base}/result?order_id={id}"));
    }

    tokio::time::sleep(Duration::from_millis(500)).await;

    let result = send(&app, get(&format!("{base}/result?order_id={id}"), &cookie)).await;
    let done = body_string(result).await;
    assert!(done.contains(r#"<span class="status">completed</span>"#));
    assert!(done.contains("Total: $299.99"));

    let again = send(&app, post(&format!("{base}/pay"), &cookie, &card)).await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let confirm = send(&app, confirm_form(base, &cookie, &id)).await;
    assert_eq!(confirm.status(), StatusCode::BAD_REQUEST);
}
