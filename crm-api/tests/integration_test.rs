use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use crm_api::{app, AppState};
use crm_store::Repositories;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::new(&Repositories::in_memory()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_customer(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/customers",
        Some(json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "{}", body);
    body["customer"]["id"].as_str().unwrap().to_string()
}

async fn create_product(app: &Router, name: &str, price: &str, stock: i32) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/products",
        Some(json!({ "name": name, "price": price, "stock": stock })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "{}", body);
    body["product"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_hello() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/hello", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hello"], "Hello, CRM!");
}

#[tokio::test]
async fn test_create_customer_messages() {
    let app = test_app();

    let (_, body) = send(
        &app,
        Method::POST,
        "/customers",
        Some(json!({ "name": "Alice", "email": "alice@example.com", "phone": "+1234567890" })),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Customer created.");
    assert_eq!(body["customer"]["phone"], "+1234567890");

    let cases = vec![
        (json!({ "name": "Bad", "email": "not-an-email" }), "Invalid email format."),
        (json!({ "name": "Again", "email": "alice@example.com" }), "Email already exists."),
        (json!({ "name": "Bob", "email": "bob@example.com", "phone": "12345" }), "Invalid phone format."),
    ];
    for (request, message) in cases {
        let (status, body) = send(&app, Method::POST, "/customers", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], message);
        assert!(body["customer"].is_null());
    }

    let (_, page) = send(&app, Method::GET, "/customers", None).await;
    assert_eq!(page["total_count"], 1);
}

#[tokio::test]
async fn test_overlong_customer_name_is_a_message_not_a_server_error() {
    let app = test_app();
    let name = "a".repeat(300);

    let (status, body) = send(
        &app,
        Method::POST,
        "/customers",
        Some(json!({ "name": name, "email": "wide@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Name must be at most 255 characters.");
    assert_eq!(body["customer"], Value::Null);
}

#[tokio::test]
async fn test_bulk_create_customers() {
    let app = test_app();
    let rows = json!({
        "customers": [
            { "name": "Dana", "email": "dana@example.com" },
            { "name": "Eve", "email": "eve@" },
            { "name": "Frank", "email": "frank@example.com", "phone": "123-456-7890" },
            { "email": "nameless@example.com" }
        ]
    });

    let (status, body) = send(&app, Method::POST, "/customers/bulk", Some(rows)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"].as_array().unwrap().len(), 2);

    let errors: Vec<&str> = body["errors"].as_array().unwrap().iter().map(|e| e.as_str().unwrap()).collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("Row 2: "));
    assert!(errors[1].starts_with("Row 4: "));
}

#[tokio::test]
async fn test_create_product_messages() {
    let app = test_app();

    let (_, body) = send(&app, Method::POST, "/products", Some(json!({ "name": "Cable", "price": "4.50" }))).await;
    assert_eq!(body["message"], "Product created.");
    assert_eq!(body["product"]["stock"], 0);
    assert_eq!(body["product"]["price"], "4.50");

    let (_, body) = send(&app, Method::POST, "/products", Some(json!({ "name": "Free", "price": "0" }))).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Price must be positive.");

    let (_, body) = send(
        &app,
        Method::POST,
        "/products",
        Some(json!({ "name": "Ghost", "price": "1.00", "stock": -1 })),
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Stock cannot be negative.");
}

#[tokio::test]
async fn test_order_for_alice_and_laptop() {
    let app = test_app();
    let alice = create_customer(&app, "Alice", "alice@example.com").await;
    let laptop = create_product(&app, "Laptop", "999.99", 10).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({ "customer_id": alice, "product_ids": [laptop] })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "created");
    assert_eq!(body["order"]["total_amount"], "999.99");
    assert_eq!(body["order"]["customer"]["email"], "alice@example.com");

    // The created order is returned with an id the caller can fetch
    let order_id = body["order"]["id"].as_str().unwrap();
    let (status, fetched) = send(&app, Method::GET, &format!("/orders/{}", order_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["products"][0]["name"], "Laptop");
}

#[tokio::test]
async fn test_order_with_unknown_product_fails() {
    let app = test_app();
    let alice = create_customer(&app, "Alice", "alice@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({ "customer_id": alice, "product_ids": [uuid::Uuid::new_v4()] })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["kind"], "NOT_FOUND");

    let (_, page) = send(&app, Method::GET, "/orders", None).await;
    assert_eq!(page["total_count"], 0);
}

#[tokio::test]
async fn test_order_with_repeated_product_is_partial_match() {
    let app = test_app();
    let alice = create_customer(&app, "Alice", "alice@example.com").await;
    let mouse = create_product(&app, "Mouse", "19.99", 100).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({ "customer_id": alice, "product_ids": [mouse, mouse] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "PARTIAL_MATCH");
}

#[tokio::test]
async fn test_restock_low_stock_product() {
    let app = test_app();
    create_product(&app, "Keyboard", "49.99", 5).await;
    create_product(&app, "Phone", "499.99", 25).await;

    let (status, body) = send(&app, Method::POST, "/products/restock", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "1 products restocked.");
    assert_eq!(body["updated_products"][0]["name"], "Keyboard");
    assert_eq!(body["updated_products"][0]["stock"], 15);

    let (_, page) = send(&app, Method::GET, "/products?stock_lt=10", None).await;
    assert_eq!(page["total_count"], 0);
}

#[tokio::test]
async fn test_listing_order_by() {
    let app = test_app();
    create_product(&app, "Laptop", "999.99", 10).await;
    create_product(&app, "Mouse", "19.99", 100).await;
    create_product(&app, "Phone", "499.99", 25).await;

    let (_, page) = send(&app, Method::GET, "/products?order_by=-price", None).await;
    let names: Vec<&str> = page["items"].as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Laptop", "Phone", "Mouse"]);

    let (_, page) = send(&app, Method::GET, "/products?price_gte=100&price_lte=600", None).await;
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["items"][0]["name"], "Phone");

    let (status, body) = send(&app, Method::GET, "/products?order_by=colour", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("colour"));
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let app = test_app();
    let (status, _) = send(&app, Method::GET, &format!("/orders/{}", uuid::Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
