// Request handlers
// Thin adapters from HTTP forms and cookies to shop operations

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::render;
use crate::observability::request_span;
use crate::shop::models::Session;
use crate::shop::orders::PaymentDetails;
use crate::shop::{PaymentOutcome, Shop, ShopError};

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Default, Deserialize)]
pub struct AddToCartForm {
    pub product_id: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentForm {
    pub order_id: Option<String>,
    pub card_number: Option<String>,
    pub cvv: Option<String>,
}

/// `order_id` from a query string or a form body
#[derive(Debug, Default, Deserialize)]
pub struct OrderRef {
    pub order_id: Option<String>,
}

impl OrderRef {
    fn id(&self) -> Option<&str> {
        self.order_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A failed shop operation, rendered for the shop it happened in
pub struct Rejection {
    base_path: String,
    error: ShopError,
}

impl Rejection {
    fn new(shop: &Shop, error: ShopError) -> Self {
        Self {
            base_path: shop.variant().base_path(),
            error,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        debug!(error = %self.error, "Request rejected");

        match self.error {
            ShopError::UnknownProduct(_) | ShopError::InvalidQuantity(_) | ShopError::EmptyCart => {
                Redirect::to(&self.base_path).into_response()
            }
            ShopError::OrderNotFound(_) => {
                (StatusCode::NOT_FOUND, "Order not found").into_response()
            }
            ShopError::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
            ShopError::AlreadyProcessed(_) => {
                (StatusCode::BAD_REQUEST, "Order already processed").into_response()
            }
            ShopError::IncompletePayment => {
                (StatusCode::BAD_REQUEST, "Payment details required").into_response()
            }
        }
    }
}

type HandlerResult = Result<Response, Rejection>;

/// Resolve the session cookie, minting a session and cookie when needed
pub fn resolve_session(shop: &Shop, jar: CookieJar) -> (CookieJar, Session) {
    let presented = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());
    let outcome = shop.sessions().ensure_session(presented.as_deref());

    if !outcome.created {
        return (jar, outcome.session);
    }

    let cookie = Cookie::build((SESSION_COOKIE, outcome.session.session_id.clone()))
        .path("/")
        .http_only(true);
    (jar.add(cookie), outcome.session)
}

/// Unparsable quantities become 0, which every shop rejects
fn parse_quantity(raw: Option<&str>) -> i64 {
    raw.and_then(|q| q.trim().parse().ok()).unwrap_or(0)
}

fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|p| p.trim().parse().ok())
}

fn redirect_home(shop: &Shop) -> Response {
    Redirect::to(&shop.variant().base_path()).into_response()
}

/// Redirect to `{base}/{step}?order_id=..` with the id percent-encoded.
/// Unvalidated ids may hold any text, and a location header must stay visible ASCII.
fn redirect_to_order(base: &str, step: &str, order_id: &str) -> Response {
    Redirect::to(&format!("{base}/{step}?order_id={}", urlencoding::encode(order_id)))
        .into_response()
}

pub async fn home() -> Html<String> {
    Html(render::home_page())
}

pub async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_str!("../../static/style.css"),
    )
}

/// GET `/{variant}`
pub async fn shop_page(State(shop): State<Arc<Shop>>, jar: CookieJar) -> Response {
    let span = request_span(shop.variant().slug(), "shop");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);
    let cart = shop.cart(&session);
    let products = shop.catalog().list_products();

    (jar, Html(render::shop_page(&shop, &products, &cart))).into_response()
}

/// Any non-POST request to a mutating route
pub async fn back_to_shop(State(shop): State<Arc<Shop>>) -> Response {
    redirect_home(&shop)
}

/// POST `/{variant}/add-to-cart`
pub async fn add_to_cart(
    State(shop): State<Arc<Shop>>,
    jar: CookieJar,
    form: Result<Form<AddToCartForm>, FormRejection>,
) -> Response {
    let span = request_span(shop.variant().slug(), "add-to-cart");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);
    let form = form.map(|Form(form)| form).unwrap_or_default();

    let quantity = parse_quantity(form.quantity.as_deref());
    let client_price = if shop.carts().pricing().accepts_client_price() {
        parse_price(form.price.as_deref())
    } else {
        None
    };
    let product_id = form.product_id.unwrap_or_default();

    let result = shop
        .add_to_cart(&session, &product_id, quantity, client_price)
        .map(|cart| {
            info!(
                product_id = %product_id,
                quantity = quantity,
                total = cart.total,
                "Added to cart"
            );
            redirect_home(&shop)
        })
        .map_err(|e| Rejection::new(&shop, e));

    (jar, result).into_response()
}

/// POST `/{variant}/checkout`
pub async fn checkout(State(shop): State<Arc<Shop>>, jar: CookieJar) -> Response {
    let span = request_span(shop.variant().slug(), "checkout");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);

    let result: HandlerResult = shop
        .checkout(&session)
        .map(|order| redirect_to_order(&shop.variant().base_path(), "pay", &order.id))
        .map_err(|e| Rejection::new(&shop, e));

    (jar, result).into_response()
}

/// GET `/{variant}/pay`
pub async fn payment_page(
    State(shop): State<Arc<Shop>>,
    jar: CookieJar,
    Query(query): Query<OrderRef>,
) -> Response {
    let span = request_span(shop.variant().slug(), "pay");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);
    let Some(order_id) = query.id() else {
        return (jar, redirect_home(&shop)).into_response();
    };

    let result: HandlerResult = shop
        .order_for(order_id, &session)
        .map(|order| Html(render::payment_page(&shop, &order)).into_response())
        .map_err(|e| Rejection::new(&shop, e));

    (jar, result).into_response()
}

/// POST `/{variant}/pay`
pub async fn submit_payment(
    State(shop): State<Arc<Shop>>,
    jar: CookieJar,
    form: Result<Form<PaymentForm>, FormRejection>,
) -> Response {
    let span = request_span(shop.variant().slug(), "pay");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);
    let form = form.map(|Form(form)| form).unwrap_or_default();

    let Some(order_id) = form.order_id.as_deref().filter(|id| !id.is_empty()) else {
        return (jar, redirect_home(&shop)).into_response();
    };

    let details = PaymentDetails {
        card_number: form.card_number.clone().unwrap_or_default(),
        cvv: form.cvv.clone().unwrap_or_default(),
    };

    let base = shop.variant().base_path();
    let result: HandlerResult = shop
        .submit_payment(order_id, &session, &details)
        .map(|outcome| match outcome {
            PaymentOutcome::ConfirmNext { order_id } => {
                redirect_to_order(&base, "confirm", &order_id)
            }
            PaymentOutcome::Processing { order_id } => {
                redirect_to_order(&base, "result", &order_id)
            }
        })
        .map_err(|e| Rejection::new(&shop, e));

    (jar, result).into_response()
}

/// GET `/{variant}/confirm`
pub async fn confirm_page(
    State(shop): State<Arc<Shop>>,
    jar: CookieJar,
    Query(query): Query<OrderRef>,
) -> Response {
    let span = request_span(shop.variant().slug(), "confirm");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);
    let Some(order_id) = query.id() else {
        return (jar, redirect_home(&shop)).into_response();
    };

    let result: HandlerResult = shop
        .order_for(order_id, &session)
        .map(|order| Html(render::confirm_page(&shop, &order)).into_response())
        .map_err(|e| Rejection::new(&shop, e));

    (jar, result).into_response()
}

/// POST `/{variant}/confirm`
pub async fn confirm_order(
    State(shop): State<Arc<Shop>>,
    jar: CookieJar,
    form: Result<Form<OrderRef>, FormRejection>,
) -> Response {
    let span = request_span(shop.variant().slug(), "confirm");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let Some(order_id) = form.id() else {
        return (jar, redirect_home(&shop)).into_response();
    };

    let result: HandlerResult = shop
        .confirm(order_id, &session)
        .map(|order| redirect_to_order(&shop.variant().base_path(), "result", &order.id))
        .map_err(|e| Rejection::new(&shop, e));

    (jar, result).into_response()
}

/// GET `/{variant}/result`
pub async fn order_result(
    State(shop): State<Arc<Shop>>,
    jar: CookieJar,
    Query(query): Query<OrderRef>,
) -> Response {
    let span = request_span(shop.variant().slug(), "result");
    let _guard = span.enter();

    let (jar, session) = resolve_session(&shop, jar);
    let Some(order_id) = query.id() else {
        return (jar, redirect_home(&shop)).into_response();
    };

    let result: HandlerResult = shop
        .order_for(order_id, &session)
        .map(|order| Html(render::result_page(&shop, &order)).into_response())
        .map_err(|e| Rejection::new(&shop, e));

    (jar, result).into_response()
}
