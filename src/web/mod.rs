// Web layer
// Routes every shop under its own path prefix behind one axum router

pub mod handlers;
pub mod render;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ShopConfig;
use crate::shop::catalog::Catalog;
use crate::shop::Shop;
use crate::store::Stores;

pub use handlers::SESSION_COOKIE;

/// Build the full application over fresh in-memory stores
pub fn app(config: &ShopConfig, shutdown: &CancellationToken) -> Router {
    let stores = Stores::in_memory();
    Catalog::seeded(stores.products.clone());

    let shops = Shop::all(&stores, &config.shop, shutdown);
    build_router(shops)
}

/// Landing page, stylesheet and one route group per shop
pub fn build_router(shops: Vec<Arc<Shop>>) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::home))
        .route("/static/style.css", get(handlers::stylesheet));

    for shop in shops {
        info!(variant = %shop.variant(), path = %shop.variant().base_path(), "Mounting shop");
        router = router.merge(shop_routes(shop));
    }

    router.layer(TraceLayer::new_for_http())
}

/// Routes for a single shop
fn shop_routes(shop: Arc<Shop>) -> Router {
    let base = shop.variant().base_path();

    Router::new()
        .route(&base, get(handlers::shop_page))
        .route(
            &format!("{base}/add-to-cart"),
            axum::routing::post(handlers::add_to_cart).fallback(handlers::back_to_shop),
        )
        .route(
            &format!("{base}/checkout"),
            axum::routing::post(handlers::checkout).fallback(handlers::back_to_shop),
        )
        .route(
            &format!("{base}/pay"),
            get(handlers::payment_page)
                .post(handlers::submit_payment)
                .fallback(handlers::back_to_shop),
        )
        .route(
            &format!("{base}/confirm"),
            get(handlers::confirm_page)
                .post(handlers::confirm_order)
                .fallback(handlers::back_to_shop),
        )
        .route(&format!("{base}/result"), get(handlers::order_result))
        .with_state(shop)
}
