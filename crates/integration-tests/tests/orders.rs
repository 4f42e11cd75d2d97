//! Integration tests for checkout and the pay/deliver lifecycle.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - A seeded store (cargo run -p techshop-cli -- seed)
//! - The API server running (cargo run -p techshop-api)
//!
//! Run with: cargo test -p techshop-integration-tests -- --ignored

use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde_json::{Value, json};

use techshop_core::cart::{Cart, CartLine, ShippingAddress};
use techshop_core::{Price, ProductId};

use techshop_integration_tests::{
    TestUser, api_base_url, database_url, register_unique, seeded_admin,
};

fn shipping() -> Value {
    json!({
        "address": "1 Main St",
        "city": "Springfield",
        "postalCode": "12345",
        "country": "USA",
    })
}

fn one_line_order(product_id: i64, price: &str, total: &str) -> Value {
    json!({
        "orderItems": [{
            "product": product_id,
            "name": "Phone",
            "image": "/images/phone.jpg",
            "price": price,
        }],
        "shippingAddress": shipping(),
        "totalPrice": total,
    })
}

async fn place_order(client: &Client, user: &TestUser, body: &Value) -> reqwest::Response {
    client
        .post(format!("{}/api/orders", api_base_url()))
        .header(AUTHORIZATION, user.bearer())
        .json(body)
        .send()
        .await
        .expect("create order request failed")
}

async fn fetch_order(client: &Client, user: &TestUser, order_id: i64) -> reqwest::Response {
    client
        .get(format!("{}/api/orders/{order_id}", api_base_url()))
        .header(AUTHORIZATION, user.bearer())
        .send()
        .await
        .expect("fetch order request failed")
}

async fn pay_order(
    client: &Client,
    user: &TestUser,
    order_id: i64,
    payment_id: &str,
) -> reqwest::Response {
    client
        .put(format!("{}/api/orders/{order_id}/pay", api_base_url()))
        .header(AUTHORIZATION, user.bearer())
        .json(&json!({
            "id": payment_id,
            "status": "COMPLETED",
            "update_time": "2026-08-05T12:00:00Z",
            "payer": {"email_address": "payer@example.com"},
        }))
        .send()
        .await
        .expect("pay request failed")
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_empty_cart_rejected() {
    let client = Client::new();
    let buyer = register_unique(&client, "Empty Handed").await;

    let resp = place_order(
        &client,
        &buyer,
        &json!({
            "orderItems": [],
            "shippingAddress": shipping(),
            "totalPrice": "0",
        }),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_checkout_then_pay_scenario() {
    let client = Client::new();
    let buyer = register_unique(&client, "Phone Buyer").await;

    // One line, quantity omitted, total supplied with trailing zeros
    let resp = place_order(&client, &buyer, &one_line_order(1, "100", "100.00")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body was not JSON");

    assert_eq!(order["isPaid"], false);
    assert_eq!(order["isDelivered"], false);
    assert!(order["paidAt"].is_null());
    assert!(order["paymentResult"].is_null());

    let items = order["orderItems"].as_array().expect("order items missing");
    assert_eq!(items.len(), 1);
    let first = items.first().expect("first item missing");
    assert_eq!(first["qty"], 1, "omitted quantity defaults to 1");

    let order_id = order["id"].as_i64().expect("order missing id");

    // Record the payment confirmation
    let resp = pay_order(&client, &buyer, order_id, "abc").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = fetch_order(&client, &buyer, order_id).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let paid: Value = resp.json().await.expect("order body was not JSON");
    assert_eq!(paid["isPaid"], true);
    assert!(!paid["paidAt"].is_null());
    assert_eq!(paid["paymentResult"]["id"], "abc");
    assert_eq!(paid["isDelivered"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_checkout_from_cart_store() {
    let client = Client::new();
    let buyer = register_unique(&client, "Cart Shopper").await;

    // Build the order the way a client does: through the cart store
    let mut cart = Cart::default();
    cart.upsert_line(CartLine {
        product: ProductId::new(1),
        name: "Airpods Wireless Bluetooth Headphones".to_string(),
        image: "/images/airpods.jpg".to_string(),
        price: Price::parse("89.99".parse().expect("bad decimal")).expect("bad price"),
        qty: 2,
    });
    cart.shipping_address = Some(ShippingAddress {
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
        country: "USA".to_string(),
    });

    let body = json!({
        "orderItems": cart.items,
        "shippingAddress": cart.shipping_address,
        "totalPrice": cart.items_total().to_string(),
    });

    let resp = place_order(&client, &buyer, &body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body was not JSON");

    let items = order["orderItems"].as_array().expect("order items missing");
    assert_eq!(items.first().expect("first item missing")["qty"], 2);
    assert_eq!(order["totalPrice"], "179.98");
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_total_mismatch_rejected() {
    let client = Client::new();
    let buyer = register_unique(&client, "Creative Accountant").await;

    // One 100.00 line, but a 1.00 total
    let resp = place_order(&client, &buyer, &one_line_order(1, "100", "1.00")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // The rejected order must not exist
    let resp = client
        .get(format!("{}/api/orders/myorders/{}", api_base_url(), buyer.id))
        .header(AUTHORIZATION, buyer.bearer())
        .send()
        .await
        .expect("myorders request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Vec<Value> = resp.json().await.expect("body was not JSON");
    assert!(orders.is_empty());
}

// ============================================================================
// Pay / Deliver Transitions
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_repeated_pay_is_a_no_op() {
    let client = Client::new();
    let buyer = register_unique(&client, "Double Payer").await;

    let resp = place_order(&client, &buyer, &one_line_order(1, "100", "100.00")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body was not JSON");
    let order_id = order["id"].as_i64().expect("order missing id");

    let resp = pay_order(&client, &buyer, order_id, "first-payment").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first: Value = resp.json().await.expect("order body was not JSON");
    let first_paid_at = first["paidAt"].clone();

    // A second confirmation changes nothing
    let resp = pay_order(&client, &buyer, order_id, "second-payment").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let second: Value = resp.json().await.expect("order body was not JSON");

    assert_eq!(second["paymentResult"]["id"], "first-payment");
    assert_eq!(second["paidAt"], first_paid_at);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_deliver_is_independent_of_payment() {
    let client = Client::new();
    let admin = seeded_admin(&client).await;
    let buyer = register_unique(&client, "Patient Buyer").await;

    let resp = place_order(&client, &buyer, &one_line_order(1, "100", "100.00")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body was not JSON");
    let order_id = order["id"].as_i64().expect("order missing id");

    // Deliver the unpaid order
    let resp = client
        .put(format!("{}/api/orders/{order_id}/deliver", api_base_url()))
        .header(AUTHORIZATION, admin.bearer())
        .send()
        .await
        .expect("deliver request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let delivered: Value = resp.json().await.expect("order body was not JSON");

    assert_eq!(delivered["isDelivered"], true);
    assert!(!delivered["deliveredAt"].is_null());
    assert_eq!(delivered["isPaid"], false, "delivery must not imply payment");
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_deliver_requires_admin() {
    let client = Client::new();
    let buyer = register_unique(&client, "Impatient Buyer").await;

    let resp = place_order(&client, &buyer, &one_line_order(1, "100", "100.00")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body was not JSON");
    let order_id = order["id"].as_i64().expect("order missing id");

    let resp = client
        .put(format!("{}/api/orders/{order_id}/deliver", api_base_url()))
        .header(AUTHORIZATION, buyer.bearer())
        .send()
        .await
        .expect("deliver request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_pay_missing_order_not_found() {
    let client = Client::new();
    let buyer = register_unique(&client, "Lost Payer").await;

    let resp = pay_order(&client, &buyer, 99_999_999, "ghost").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// History & Access Control
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and seeded database"]
async fn test_order_access_control() {
    let client = Client::new();
    let buyer = register_unique(&client, "Private Buyer").await;
    let stranger = register_unique(&client, "Nosy Stranger").await;
    let admin = seeded_admin(&client).await;

    let resp = place_order(&client, &buyer, &one_line_order(1, "100", "100.00")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body was not JSON");
    let order_id = order["id"].as_i64().expect("order missing id");

    // The purchaser and admins may read the order; a stranger may not
    assert_eq!(fetch_order(&client, &buyer, order_id).await.status(), StatusCode::OK);
    assert_eq!(fetch_order(&client, &admin, order_id).await.status(), StatusCode::OK);
    assert_eq!(
        fetch_order(&client, &stranger, order_id).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // Same rule for buyer history
    let resp = client
        .get(format!("{}/api/orders/myorders/{}", api_base_url(), buyer.id))
        .header(AUTHORIZATION, stranger.bearer())
        .send()
        .await
        .expect("myorders request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("{}/api/orders/myorders/{}", api_base_url(), buyer.id))
        .header(AUTHORIZATION, buyer.bearer())
        .send()
        .await
        .expect("myorders request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Vec<Value> = resp.json().await.expect("body was not JSON");
    assert_eq!(orders.len(), 1);

    // The admin list resolves purchaser names
    let resp = client
        .get(format!("{}/api/orders", api_base_url()))
        .header(AUTHORIZATION, admin.bearer())
        .send()
        .await
        .expect("all orders request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let all: Vec<Value> = resp.json().await.expect("body was not JSON");
    let ours = all
        .iter()
        .find(|o| o["id"].as_i64() == Some(order_id))
        .expect("order missing from admin list");
    assert_eq!(ours["user"]["name"], "Private Buyer");

    // The all-orders list is admin-only
    let resp = client
        .get(format!("{}/api/orders", api_base_url()))
        .header(AUTHORIZATION, buyer.bearer())
        .send()
        .await
        .expect("all orders request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database access"]
async fn test_deleted_purchaser_reads_as_placeholder() {
    let client = Client::new();
    let admin = seeded_admin(&client).await;
    let buyer = register_unique(&client, "Vanishing Buyer").await;

    let resp = place_order(&client, &buyer, &one_line_order(1, "100", "100.00")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body was not JSON");
    let order_id = order["id"].as_i64().expect("order missing id");

    // Remove the account out from under the order
    let pool = sqlx::PgPool::connect(&database_url())
        .await
        .expect("database connection failed");
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(i32::try_from(buyer.id).expect("user id out of range"))
        .execute(&pool)
        .await
        .expect("user delete failed");

    // The order still reads, with the purchaser degraded to a placeholder
    let resp = fetch_order(&client, &admin, order_id).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let orphaned: Value = resp.json().await.expect("order body was not JSON");
    assert_eq!(orphaned["user"]["name"], "unknown customer");
    assert!(orphaned["user"]["email"].is_null());
}
