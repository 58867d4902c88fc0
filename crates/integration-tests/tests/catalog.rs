//! Catalog administration and public visibility.

use bazaar_integration_tests::{Session, api, create_stocked_product, read};
use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_created_product_is_public() {
    let admin = Session::admin().await;
    let product_id = create_stocked_product(&admin, "12.50", 3).await;

    let resp = Client::new()
        .get(api(&format!("/products/{product_id}")))
        .send()
        .await
        .expect("Failed to fetch product");
    let (status, body) = read(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], product_id);
    assert_eq!(body["data"]["price"], "12.50");
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_soft_deleted_product_visible_to_admin_only() {
    let admin = Session::admin().await;
    let product_id = create_stocked_product(&admin, "5.00", 1).await;

    let (status, _) = admin.delete(&format!("/admin/products/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let resp = Client::new()
        .get(api(&format!("/products/{product_id}")))
        .send()
        .await
        .expect("Failed to fetch product");
    let (status, body) = read(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "product not found");

    let (status, body) = admin.get(&format!("/admin/products/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_soft_deleted_category_visible_to_admin_only() {
    let admin = Session::admin().await;
    let suffix = Uuid::new_v4().simple().to_string();
    let (status, body) = admin
        .send(
            Method::POST,
            "/admin/categories",
            &json!({ "name": format!("Retired {suffix}"), "slug": format!("retired-{suffix}") }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let category_id = body["data"]["id"].as_i64().expect("category id");

    let (status, _) = admin.delete(&format!("/admin/categories/{category_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let client = Client::new();
    let resp = client
        .get(api("/categories"))
        .send()
        .await
        .expect("Failed to list categories");
    let (status, body) = read(resp).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().cloned().unwrap_or_default();
    assert!(listed.iter().all(|c| c["id"] != category_id));

    let resp = client
        .get(api(&format!("/categories/{category_id}")))
        .send()
        .await
        .expect("Failed to fetch category");
    let (status, body) = read(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "category not found");

    let (status, body) = admin.get(&format!("/admin/categories/{category_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_search_wildcards_match_literally() {
    let resp = Client::new()
        .get(api("/products/search?q=%25&limit=100"))
        .send()
        .await
        .expect("Failed to search");
    let (status, body) = read(resp).await;

    assert_eq!(status, StatusCode::OK);
    let products = body["data"].as_array().cloned().unwrap_or_default();
    assert!(products.iter().all(|p| {
        let name = p["name"].as_str().unwrap_or_default();
        let description = p["description"].as_str().unwrap_or_default();
        name.contains('%') || description.contains('%')
    }));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_search_requires_term() {
    let resp = Client::new()
        .get(api("/products/search"))
        .send()
        .await
        .expect("Failed to search");
    let (status, body) = read(resp).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search term is required");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_review_once_per_product() {
    let admin = Session::admin().await;
    let product_id = create_stocked_product(&admin, "8.00", 1).await;
    let customer = Session::new_customer().await;

    let review = json!({ "product_id": product_id, "rating": 4, "title": "Solid" });
    let (status, body) = customer.send(Method::POST, "/reviews", &review).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = customer.send(Method::POST, "/reviews", &review).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "you have already reviewed this product");

    let resp = Client::new()
        .get(api(&format!("/products/{product_id}/reviews")))
        .send()
        .await
        .expect("Failed to list reviews");
    let (status, body) = read(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_invalid_rating_rejected() {
    let admin = Session::admin().await;
    let product_id = create_stocked_product(&admin, "8.00", 1).await;
    let customer = Session::new_customer().await;

    let (status, _) = customer
        .send(
            Method::POST,
            "/reviews",
            &json!({ "product_id": product_id, "rating": 6 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
