//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use techshop_core::cart::ShippingAddress;
use techshop_core::{OrderId, OrderItemId, Price, ProductId, UserId};

/// An order: line-item snapshots plus the pay/deliver lifecycle flags.
///
/// `is_paid` and `is_delivered` are independent booleans, not a linear
/// state chain: an order can be delivered before its payment is recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Purchasing user; may dangle once the account is deleted.
    pub user: UserId,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_price: Price,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    /// Payment confirmation, stored verbatim by the pay transition.
    pub payment_result: Option<PaymentResult>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A line item: a snapshot of a purchased product, decoupled from the live
/// catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    /// Catalog product this line snapshots; may dangle after deletion.
    pub product: ProductId,
    pub name: String,
    pub qty: i32,
    pub image: String,
    /// Unit price at purchase time.
    pub price: Price,
}

/// Payment confirmation record as the payment provider reports it.
///
/// Field names follow the provider's capture payload, not our casing
/// conventions.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResult {
    /// Provider-side transaction id.
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}
