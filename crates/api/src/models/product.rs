//! Product and review domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use techshop_core::{Price, ProductId, Rating, ReviewId, UserId};

/// A catalog product with its embedded review list.
///
/// `rating` and `num_reviews` are derived: they are recomputed from the
/// full review list on every review append, never edited directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Image path served by the frontend.
    pub image: String,
    pub brand: String,
    pub category: String,
    pub count_in_stock: i32,
    pub description: String,
    /// Arithmetic mean of all review ratings, 0 when unreviewed.
    pub rating: Decimal,
    /// Count of reviews, kept in lockstep with `reviews`.
    pub num_reviews: i32,
    /// Reviews in submission order.
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single product review.
///
/// The author name is a denormalized copy taken at submission time, so the
/// review stays readable after the author's account is gone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique review ID.
    pub id: ReviewId,
    /// Author display name, copied at submission time.
    #[serde(rename = "name")]
    pub author_name: String,
    pub rating: Rating,
    pub comment: String,
    /// Authoring user; may dangle once the account is deleted.
    pub user: UserId,
    pub created_at: DateTime<Utc>,
}
