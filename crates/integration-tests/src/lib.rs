//! Integration tests for the Bazaar API.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a database, then start the API
//! cargo run -p bazaar-cli -- migrate
//! cargo run -p bazaar-cli -- seed
//! cargo run -p bazaar-api
//!
//! # Run the ignored tests against it
//! BAZAAR_BASE_URL=http://localhost:8080 cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! Tests sign up fresh users with random emails, so they can run repeatedly
//! against the same database. Admin tests log in as the seeded
//! `admin@ecommerce.com`.

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every account the tests create.
pub const TEST_PASSWORD: &str = "integration-pass-123";

/// Seeded admin credentials.
pub const ADMIN_EMAIL: &str = "admin@ecommerce.com";
pub const ADMIN_PASSWORD: &str = "password123";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("BAZAAR_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// `{base_url}/api/v1{path}`
#[must_use]
pub fn api(path: &str) -> String {
    format!("{}/api/v1{path}", base_url())
}

/// Read a response as `(status, json body)`.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn read(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json().await.expect("Response body is not JSON");
    (status, body)
}

/// A random address in the 198.18.0.0/15 benchmarking range.
///
/// Auth routes are rate limited per client IP, so every session presents its
/// own `X-Forwarded-For` to keep parallel tests from sharing a bucket.
#[must_use]
pub fn client_ip() -> String {
    let [a, b, ..] = *Uuid::new_v4().as_bytes();
    format!("198.18.{a}.{b}")
}

/// A client acting as one user.
pub struct Session {
    pub client: Client,
    pub token: String,
    pub email: String,
}

impl Session {
    /// Sign up a new customer with a random email and log in.
    ///
    /// # Panics
    ///
    /// Panics if the server is unreachable or either call fails.
    pub async fn new_customer() -> Self {
        let client = Client::new();
        let email = format!("it-{}@example.com", Uuid::new_v4());
        let ip = client_ip();

        let resp = client
            .post(api("/auth/signup"))
            .header("x-forwarded-for", &ip)
            .json(&json!({
                "email": email,
                "password": TEST_PASSWORD,
                "first_name": "Integration",
                "last_name": "Test",
            }))
            .send()
            .await
            .expect("Failed to sign up");
        assert_eq!(resp.status(), StatusCode::CREATED);

        Self::login(client, &ip, &email, TEST_PASSWORD).await
    }

    /// Log in as the seeded admin.
    ///
    /// # Panics
    ///
    /// Panics if the seed data is missing.
    pub async fn admin() -> Self {
        Self::login(Client::new(), &client_ip(), ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    async fn login(client: Client, ip: &str, email: &str, password: &str) -> Self {
        let resp = client
            .post(api("/auth/login"))
            .header("x-forwarded-for", ip)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in");
        let (status, body) = read(resp).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        let token = body["data"]["token"]
            .as_str()
            .expect("login response has no token")
            .to_string();
        Self {
            client,
            token,
            email: email.to_string(),
        }
    }

    /// GET with the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(api(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("GET failed");
        read(resp).await
    }

    /// Send a JSON body with the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn send(&self, method: reqwest::Method, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .request(method, api(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .expect("request failed");
        read(resp).await
    }

    /// DELETE with the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .delete(api(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("DELETE failed");
        read(resp).await
    }
}

/// Create an active product with `stock` units through the admin API.
///
/// Returns the product id.
///
/// # Panics
///
/// Panics if any admin call fails.
pub async fn create_stocked_product(admin: &Session, price: &str, stock: i32) -> i64 {
    let suffix = Uuid::new_v4().simple().to_string();

    let (status, body) = admin
        .send(
            reqwest::Method::POST,
            "/admin/categories",
            &json!({ "name": format!("IT {suffix}"), "slug": format!("it-{suffix}") }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "category: {body}");
    let category_id = body["data"]["id"].as_i64().expect("category id");

    let (status, body) = admin
        .send(
            reqwest::Method::POST,
            "/admin/products",
            &json!({
                "name": format!("Widget {suffix}"),
                "slug": format!("widget-{suffix}"),
                "description": "Integration test widget",
                "price": price,
                "category_id": category_id,
                "sku": format!("IT-{suffix}"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "product: {body}");
    let product_id = body["data"]["id"].as_i64().expect("product id");

    let inventory_id = find_inventory_id(admin, product_id).await;
    let (status, body) = admin
        .send(
            reqwest::Method::PUT,
            &format!("/admin/inventory/{inventory_id}"),
            &json!({ "quantity": stock }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "inventory: {body}");
    assert_eq!(body["data"]["available"], stock);

    product_id
}

async fn find_inventory_id(admin: &Session, product_id: i64) -> i64 {
    let mut offset = 0;
    loop {
        let (status, body) = admin
            .get(&format!("/admin/inventory?limit=100&offset={offset}"))
            .await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"].as_array().cloned().unwrap_or_default();
        assert!(!rows.is_empty(), "no inventory row for product {product_id}");
        if let Some(row) = rows.iter().find(|r| r["product_id"] == product_id) {
            return row["id"].as_i64().expect("inventory id");
        }
        offset += 100;
    }
}
