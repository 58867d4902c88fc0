//! Account lifecycle against a running API.
//!
//! Run with: `cargo test -p bazaar-integration-tests -- --ignored`

use bazaar_integration_tests::{Session, TEST_PASSWORD, api, client_ip, read};
use reqwest::{Client, Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", bazaar_integration_tests::base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    let (status, body) = read(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_signup_login_profile() {
    let session = Session::new_customer().await;

    let (status, body) = session.get("/users/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], session.email.as_str());
    assert_eq!(body["data"]["role"], "customer");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = session
        .send(Method::PUT, "/users/me", &json!({ "first_name": "Renamed", "last_name": "" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Renamed");
    assert_eq!(body["data"]["last_name"], "Test");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_signup_rejected() {
    let session = Session::new_customer().await;

    let resp = Client::new()
        .post(api("/auth/signup"))
        .header("x-forwarded-for", client_ip())
        .json(&json!({
            "email": session.email,
            "password": TEST_PASSWORD,
            "first_name": "Again",
            "last_name": "Test",
        }))
        .send()
        .await
        .expect("Failed to sign up");
    let (status, body) = read(resp).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email already exists");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password() {
    let session = Session::new_customer().await;

    let resp = Client::new()
        .post(api("/auth/login"))
        .header("x-forwarded-for", client_ip())
        .json(&json!({ "email": session.email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to log in");
    let (status, body) = read(resp).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid email or password");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_change_password_requires_current() {
    let session = Session::new_customer().await;

    let (status, body) = session
        .send(
            Method::PUT,
            "/users/me/password",
            &json!({ "current_password": "wrong-password", "new_password": "another-pass-456" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "current password is incorrect");

    let (status, _) = session
        .send(
            Method::PUT,
            "/users/me/password",
            &json!({ "current_password": TEST_PASSWORD, "new_password": "another-pass-456" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_customer_is_not_admin() {
    let session = Session::new_customer().await;

    let (status, body) = session.get("/admin/inventory").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
}
