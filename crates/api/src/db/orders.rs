//! Order repository: checkout, the pay/deliver transitions, and history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use techshop_core::cart::ShippingAddress;
use techshop_core::{OrderId, OrderItemId, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem, PaymentResult};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    ship_address: String,
    ship_city: String,
    ship_postal_code: String,
    ship_country: String,
    total_price: Price,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_id: Option<String>,
    payment_status: Option<String>,
    payment_update_time: Option<String>,
    payer_email: Option<String>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Order {
        // The payment columns are written together by the pay transition;
        // the transaction id alone decides whether a record exists.
        let payment_result = self.payment_id.map(|id| PaymentResult {
            id,
            status: self.payment_status.unwrap_or_default(),
            update_time: self.payment_update_time.unwrap_or_default(),
            email_address: self.payer_email.unwrap_or_default(),
        });

        Order {
            id: OrderId::new(self.id),
            user: UserId::new(self.user_id),
            order_items,
            shipping_address: ShippingAddress {
                address: self.ship_address,
                city: self.ship_city,
                postal_code: self.ship_postal_code,
                country: self.ship_country,
            },
            total_price: self.total_price,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            payment_result,
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
        }
    }
}

/// Internal row type for `PostgreSQL` order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    name: String,
    qty: i32,
    image: String,
    price: Price,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product: ProductId::new(row.product_id),
            name: row.name,
            qty: row.qty,
            image: row.image,
            price: row.price,
        }
    }
}

/// A normalized line item ready for insertion.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product: ProductId,
    pub name: String,
    pub qty: i32,
    pub image: String,
    pub price: Price,
}

const ORDER_COLUMNS: &str = "id, user_id, ship_address, ship_city, ship_postal_code, \
                             ship_country, total_price, is_paid, paid_at, payment_id, \
                             payment_status, payment_update_time, payer_email, \
                             is_delivered, delivered_at, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with its line items.
    ///
    /// The order row and every item land in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        items: &[NewOrderItem],
        shipping: &ShippingAddress,
        total_price: Price,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO orders (user_id, ship_address, ship_city, ship_postal_code,
                                ship_country, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(&shipping.postal_code)
        .bind(&shipping.country)
        .bind(total_price)
        .fetch_one(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, name, qty, image, price)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(order_id)
            .bind(item.product)
            .bind(&item.name)
            .bind(item.qty)
            .bind(&item.image)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(OrderId::new(order_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get an order by ID, with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_by_order(&[row.id]).await?;
        let order_items = items.remove(&row.id).unwrap_or_default();

        Ok(Some(row.into_order(order_items)))
    }

    /// Record a payment confirmation on an order.
    ///
    /// The transition is a conditional update: once an order is paid,
    /// repeated calls are no-ops that return the order as already
    /// recorded, and `paid_at` and the original payment record are never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        payment: &PaymentResult,
    ) -> Result<Order, RepositoryError> {
        sqlx::query(
            r"
            UPDATE orders
            SET is_paid = TRUE, paid_at = NOW(),
                payment_id = $2, payment_status = $3,
                payment_update_time = $4, payer_email = $5
            WHERE id = $1 AND is_paid = FALSE
            ",
        )
        .bind(id)
        .bind(&payment.id)
        .bind(&payment.status)
        .bind(&payment.update_time)
        .bind(&payment.email_address)
        .execute(self.pool)
        .await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Record delivery on an order.
    ///
    /// No payment precondition: unpaid orders can be delivered, as the
    /// storefront has always allowed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET is_delivered = TRUE, delivered_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// List a user's orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// List every order in the store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.assemble(rows).await
    }

    /// Attach line items to a batch of order rows.
    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_by_order(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect())
    }

    /// Fetch line items for a set of orders, grouped by order id.
    async fn items_by_order(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, name, qty, image, price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }

        Ok(grouped)
    }
}
