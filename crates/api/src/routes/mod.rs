//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database)
//!
//! # Auth (rate limited per IP)
//! POST /api/v1/auth/signup                  - Register
//! POST /api/v1/auth/login                   - Access + refresh token
//! POST /api/v1/auth/refresh                 - New access token
//! POST /api/v1/auth/logout                  - Revoke a refresh token (auth)
//!
//! # Catalog (public)
//! GET  /api/v1/products                     - Filtered product list
//! GET  /api/v1/products/search              - Search by `q`
//! GET  /api/v1/products/{id}                - Product detail
//! GET  /api/v1/products/{id}/reviews        - Product reviews
//! GET  /api/v1/categories                   - Category list
//! GET  /api/v1/categories/{id}              - Category detail
//!
//! # Payment webhooks (HMAC signed when a secret is configured)
//! POST /api/v1/payments/webhook/stripe
//! POST /api/v1/payments/webhook/bkash
//!
//! # Account (auth)
//! GET|PUT    /api/v1/users/me
//! PUT        /api/v1/users/me/password
//! GET        /api/v1/cart
//! POST       /api/v1/cart/items
//! PUT|DELETE /api/v1/cart/items/{id}
//! DELETE     /api/v1/cart/clear
//! GET|POST   /api/v1/orders
//! GET        /api/v1/orders/{id}
//! POST       /api/v1/orders/{id}/cancel
//! POST       /api/v1/payments
//! GET        /api/v1/payments/{id}
//! POST       /api/v1/reviews
//! PUT|DELETE /api/v1/reviews/{id}
//! GET|POST   /api/v1/shipping/addresses
//! PUT|DELETE /api/v1/shipping/addresses/{id}
//!
//! # Admin (admin role)
//! POST       /api/v1/admin/products
//! GET|PUT|DELETE /api/v1/admin/products/{id}
//! POST       /api/v1/admin/categories
//! GET|PUT|DELETE /api/v1/admin/categories/{id}
//! GET        /api/v1/admin/inventory
//! PUT        /api/v1/admin/inventory/{id}
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod shipping;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Parse a numeric path id, reporting `Invalid <entity> ID` otherwise.
pub(crate) fn parse_id<T: From<i64>>(raw: &str, entity: &str) -> Result<T, AppError> {
    raw.parse::<i64>()
        .map(T::from)
        .map_err(|_| AppError::BadRequest(format!("Invalid {entity} ID")))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/search", get(products::search))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", get(products::reviews))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list))
        .route("/{id}", get(categories::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/clear", axum::routing::delete(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(payments::create))
        .route("/{id}", get(payments::show))
        .route("/webhook/stripe", post(payments::stripe_webhook))
        .route("/webhook/bkash", post(payments::bkash_webhook))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            get(admin::show_product)
                .put(admin::update_product)
                .delete(admin::delete_product),
        )
        .route("/categories", post(admin::create_category))
        .route(
            "/categories/{id}",
            get(admin::show_category)
                .put(admin::update_category)
                .delete(admin::delete_category),
        )
        .route("/inventory", get(admin::list_inventory))
        .route("/inventory/{id}", put(admin::update_inventory))
}

/// Create the versioned API router (mounted at `/api/v1`).
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route(
            "/users/me",
            get(users::profile).put(users::update_profile),
        )
        .route("/users/me/password", put(users::change_password))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .route("/reviews", post(reviews::create))
        .route("/reviews/{id}", put(reviews::update).delete(reviews::delete))
        .route(
            "/shipping/addresses",
            get(shipping::list).post(shipping::create),
        )
        .route(
            "/shipping/addresses/{id}",
            put(shipping::update).delete(shipping::delete),
        )
        .nest("/admin", admin_routes())
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_routes())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use bazaar_core::{ProductId, UserId, UserRole};

    use super::*;
    use crate::config::test_config;
    use crate::db::create_lazy_pool;
    use crate::services::NotificationService;
    use crate::services::auth::jwt::issue_token;

    fn app() -> Router {
        let config = test_config();
        let pool = create_lazy_pool(&config.database_url).unwrap();
        let notifications = NotificationService::disabled(&config.base_url);
        routes().with_state(AppState::new(config, pool, notifications))
    }

    fn bearer(role: UserRole) -> String {
        let token = issue_token(&test_config().jwt, UserId::new(7), "jane@example.com", role).unwrap();
        format!("Bearer {token}")
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_parse_id() {
        let id: ProductId = parse_id("42", "product").unwrap();
        assert_eq!(id, ProductId::new(42));

        let err = parse_id::<ProductId>("abc", "product").unwrap_err();
        assert_eq!(err.public_message(), "Invalid product ID");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(get_request("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], "E-Commerce API is running");
    }

    #[tokio::test]
    async fn test_missing_authorization_header() {
        let (status, body) = send(get_request("/api/v1/cart")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Authorization header required");
    }

    #[tokio::test]
    async fn test_malformed_authorization_header() {
        let request = Request::builder()
            .uri("/api/v1/orders")
            .header("authorization", "Token abc")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid authorization header format");
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let request = Request::builder()
            .uri("/api/v1/users/me")
            .header("authorization", "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_customer_cannot_reach_admin_routes() {
        let request = Request::builder()
            .uri("/api/v1/admin/inventory")
            .header("authorization", bearer(UserRole::Customer))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");
    }

    #[tokio::test]
    async fn test_invalid_path_id() {
        let (status, body) = send(get_request("/api/v1/products/abc")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid product ID");
    }

    #[tokio::test]
    async fn test_invalid_id_checked_before_database() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/api/v1/cart/items/xyz")
            .header("authorization", bearer(UserRole::Customer))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid item ID");
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_unparseable_webhook_payload() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/payments/webhook/stripe")
            .body(Body::from("garbage"))
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid webhook payload");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = send(get_request("/api/v1/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Route not found");
    }
}
