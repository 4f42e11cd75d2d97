//! Order lifecycle route handlers.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use techshop_core::cart::ShippingAddress;
use techshop_core::{Email, OrderId, Price, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::{NewOrderItem, OrderRepository};
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderItem, PaymentResult, User};
use crate::state::AppState;

/// Name surfaced for purchasers whose account no longer exists.
const UNKNOWN_CUSTOMER: &str = "unknown customer";

// =============================================================================
// Request Types
// =============================================================================

/// Checkout request body: the cart, submitted whole.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
    pub total_price: Decimal,
}

/// One submitted cart line.
#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product: ProductId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    /// Units of this product; omitted means 1.
    #[serde(default)]
    pub qty: Option<u32>,
}

/// Payment confirmation as the payment provider sends it.
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub payer: PayerRequest,
}

/// Payer block of the provider's capture payload.
#[derive(Debug, Deserialize)]
pub struct PayerRequest {
    pub email_address: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// An order with its purchaser resolved for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub id: OrderId,
    pub user: PurchaserResponse,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_price: Price,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<PaymentResult>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The purchaser as resolved at read time.
///
/// A deleted account degrades to a placeholder name instead of failing the
/// read.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaserResponse {
    pub id: UserId,
    pub name: String,
    pub email: Option<Email>,
}

impl OrderDetailResponse {
    fn resolve(order: Order, purchaser: Option<&User>) -> Self {
        let user = match purchaser {
            Some(u) => PurchaserResponse {
                id: u.id,
                name: u.name.clone(),
                email: Some(u.email.clone()),
            },
            None => PurchaserResponse {
                id: order.user,
                name: UNKNOWN_CUSTOMER.to_owned(),
                email: None,
            },
        };

        Self {
            id: order.id,
            user,
            order_items: order.order_items,
            shipping_address: order.shipping_address,
            total_price: order.total_price,
            is_paid: order.is_paid,
            paid_at: order.paid_at,
            payment_result: order.payment_result,
            is_delivered: order.is_delivered,
            delivered_at: order.delivered_at,
            created_at: order.created_at,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Place an order from the submitted cart.
///
/// The purchaser is the bearer identity. The supplied total must equal the
/// sum over the submitted lines; a client that disagrees with its own cart
/// is rejected.
///
/// # Errors
///
/// Returns 400 on an empty cart, a zero quantity, a negative price, or a
/// total mismatch.
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    if body.order_items.is_empty() {
        return Err(AppError::BadRequest("no order items".to_owned()));
    }

    let items = normalize_items(body.order_items)?;

    let total = Price::parse(body.total_price)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if order_total(&items) != total.amount() {
        return Err(AppError::BadRequest(
            "total price does not match order items".to_owned(),
        ));
    }

    let order = OrderRepository::new(state.pool())
        .create(user.id, &items, &body.shipping_address, total)
        .await?;

    tracing::info!(order_id = %order.id, user_id = %user.id, "order created");

    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch an order with its purchaser resolved.
///
/// # Errors
///
/// Returns 404 when the order doesn't exist, 401 when the caller is
/// neither the purchaser nor an admin.
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetailResponse>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_owned()))?;

    authorize_order_access(&user, &order)?;

    let purchaser = UserRepository::new(state.pool())
        .get_by_id(order.user)
        .await?;

    Ok(Json(OrderDetailResponse::resolve(order, purchaser.as_ref())))
}

/// Record a payment confirmation on an order.
///
/// Paying an already-paid order is a no-op returning the order as first
/// recorded.
///
/// # Errors
///
/// Returns 404 when the order doesn't exist, 401 when the caller is
/// neither the purchaser nor an admin.
pub async fn pay(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<PayRequest>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_owned()))?;
    authorize_order_access(&user, &order)?;

    let payment = PaymentResult {
        id: body.id,
        status: body.status,
        update_time: body.update_time,
        email_address: body.payer.email_address,
    };

    let order = repo.mark_paid(id, &payment).await.map_err(|e| match e {
        RepositoryError::NotFound => AppError::NotFound("order not found".to_owned()),
        other => other.into(),
    })?;

    Ok(Json(order))
}

/// Record delivery on an order (admin only).
///
/// Intentionally independent of payment state.
///
/// # Errors
///
/// Returns 404 when the order doesn't exist.
pub async fn deliver(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .mark_delivered(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("order not found".to_owned()),
            other => other.into(),
        })?;

    Ok(Json(order))
}

/// A buyer's order history.
///
/// # Errors
///
/// Returns 401 when a non-admin asks for someone else's history.
pub async fn myorders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    if !user.is_admin && user.id != user_id {
        return Err(AppError::Unauthorized(
            "not authorized to view these orders".to_owned(),
        ));
    }

    let orders = OrderRepository::new(state.pool())
        .list_by_user(user_id)
        .await?;

    Ok(Json(orders))
}

/// All orders with purchasers resolved (admin only).
///
/// # Errors
///
/// Returns 401 unless the caller is an admin.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderDetailResponse>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;

    let users: HashMap<UserId, User> = UserRepository::new(state.pool())
        .list_all()
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let resolved = orders
        .into_iter()
        .map(|order| {
            let purchaser = users.get(&order.user);
            OrderDetailResponse::resolve(order, purchaser)
        })
        .collect();

    Ok(Json(resolved))
}

// =============================================================================
// Helpers
// =============================================================================

/// The purchaser and admins may read and pay an order; nobody else.
fn authorize_order_access(user: &User, order: &Order) -> Result<()> {
    if !user.is_admin && order.user != user.id {
        return Err(AppError::Unauthorized(
            "not authorized to view this order".to_owned(),
        ));
    }
    Ok(())
}

/// Normalize submitted cart lines into persistable line items.
fn normalize_items(lines: Vec<OrderItemRequest>) -> Result<Vec<NewOrderItem>> {
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let qty = line.qty.unwrap_or(1);
        if qty == 0 {
            return Err(AppError::BadRequest(
                "item quantity must be at least 1".to_owned(),
            ));
        }

        let price = Price::parse(line.price)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        items.push(NewOrderItem {
            product: line.product,
            name: line.name,
            qty: i32::try_from(qty)
                .map_err(|_| AppError::BadRequest("item quantity too large".to_owned()))?,
            image: line.image,
            price,
        });
    }

    Ok(items)
}

/// Sum of `price * qty` over the normalized lines.
fn order_total(items: &[NewOrderItem]) -> Decimal {
    items
        .iter()
        .map(|i| i.price.amount() * Decimal::from(i.qty))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn request_line(price: &str, qty: Option<u32>) -> OrderItemRequest {
        OrderItemRequest {
            product: ProductId::new(1),
            name: "Phone".to_owned(),
            image: "/images/phone.jpg".to_owned(),
            price: dec(price),
            qty,
        }
    }

    #[test]
    fn test_normalize_defaults_qty_to_one() {
        let items = normalize_items(vec![request_line("100", None)]).unwrap();
        assert_eq!(items.first().unwrap().qty, 1);
    }

    #[test]
    fn test_normalize_rejects_zero_qty() {
        assert!(normalize_items(vec![request_line("100", Some(0))]).is_err());
    }

    #[test]
    fn test_normalize_rejects_negative_price() {
        assert!(normalize_items(vec![request_line("-1", Some(1))]).is_err());
    }

    #[test]
    fn test_order_total() {
        let items = normalize_items(vec![
            request_line("89.99", Some(2)),
            request_line("599.99", None),
        ])
        .unwrap();

        assert_eq!(order_total(&items), dec("779.97"));
    }

    #[test]
    fn test_order_total_scale_insensitive() {
        // "100.00" supplied against items summing to 100 must match.
        let items = normalize_items(vec![request_line("100", Some(1))]).unwrap();
        assert_eq!(order_total(&items), dec("100.00"));
    }
}
