//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (db probe)
//!
//! # Users
//! POST /api/users                   - Register (201)
//! POST /api/users/login             - Login (200)
//! GET  /api/users                   - List users (admin)
//!
//! # Products
//! GET    /api/products              - List/search catalog (?keyword=)
//! GET    /api/products/{id}         - Product detail with reviews
//! POST   /api/products              - Create placeholder (admin, 201)
//! PUT    /api/products/{id}         - Edit (admin)
//! DELETE /api/products/{id}         - Remove (admin)
//! POST   /api/products/{id}/reviews - Add review (authenticated, 201)
//!
//! # Orders
//! POST /api/orders                  - Place order (authenticated, 201)
//! GET  /api/orders                  - All orders (admin)
//! GET  /api/orders/{id}             - Order detail (owner or admin)
//! PUT  /api/orders/{id}/pay         - Record payment (owner or admin)
//! PUT  /api/orders/{id}/deliver     - Record delivery (admin)
//! GET  /api/orders/myorders/{userId} - Buyer history (self or admin)
//!
//! # Config
//! GET  /api/config/paypal           - PayPal client id
//! ```

pub mod config;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// Plain `{"message": "..."}` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(users::register).get(users::index))
        .route("/login", post(users::login))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/reviews", post(products::create_review))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create).get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/pay", put(orders::pay))
        .route("/{id}/deliver", put(orders::deliver))
        .route("/myorders/{user_id}", get(orders::myorders))
}

/// Create the config routes router.
pub fn config_routes() -> Router<AppState> {
    Router::new().route("/paypal", get(config::paypal))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/users", user_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/config", config_routes())
}
