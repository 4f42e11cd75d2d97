//! Product repository: catalog CRUD and the review subsystem.
//!
//! Reviews are owned by their product. Appending one recomputes the
//! product's aggregates from the full review list. That is O(n) per
//! review, which is fine at catalog scale and keeps the derived columns
//! trivially correct.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use techshop_core::{Price, ProductId, Rating, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{Product, Review};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Price,
    image: String,
    brand: String,
    category: String,
    count_in_stock: i32,
    description: String,
    rating: Decimal,
    num_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, reviews: Vec<Review>) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            price: self.price,
            image: self.image,
            brand: self.brand,
            category: self.category,
            count_in_stock: self.count_in_stock,
            description: self.description,
            rating: self.rating,
            num_reviews: self.num_reviews,
            reviews,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type for `PostgreSQL` review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    author_name: String,
    rating: Rating,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            author_name: row.author_name,
            rating: row.rating,
            comment: row.comment,
            user: UserId::new(row.user_id),
            created_at: row.created_at,
        }
    }
}

/// Editable product fields for a full-replace update.
#[derive(Debug, Clone)]
pub struct ProductEdit {
    pub name: String,
    pub price: Price,
    pub image: String,
    pub brand: String,
    pub category: String,
    pub count_in_stock: i32,
    pub description: String,
}

/// A complete catalog entry for direct insertion (seeding).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub image: String,
    pub brand: String,
    pub category: String,
    pub count_in_stock: i32,
    pub description: String,
    pub rating: Decimal,
    pub num_reviews: i32,
}

const PRODUCT_COLUMNS: &str = "id, name, price, image, brand, category, count_in_stock, \
                               description, rating, num_reviews, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product and review database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, each with its embedded review list.
    ///
    /// With a keyword, matches names case-insensitively on a substring.
    /// Returns every match; there is no pagination, a known scaling limit
    /// at catalog sizes beyond this store's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, keyword: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let rows = match keyword.filter(|kw| !kw.is_empty()) {
            Some(kw) => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE name ILIKE $1 ORDER BY id ASC"
                ))
                .bind(format!("%{kw}%"))
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut reviews = self.reviews_by_product(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let product_reviews = reviews.remove(&row.id).unwrap_or_default();
                row.into_product(product_reviews)
            })
            .collect())
    }

    /// Get a product by ID, with its embedded review list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut reviews = self.reviews_by_product(&[row.id]).await?;
        let product_reviews = reviews.remove(&row.id).unwrap_or_default();

        Ok(Some(row.into_product(product_reviews)))
    }

    /// Insert a placeholder product for an admin to edit afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_placeholder(&self) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, price, image, brand, category, count_in_stock, description)
            VALUES ('Sample Name', 0, '/images/sample.jpg', 'Sample Brand', 'Sample Category', 0, 'Sample description')
            RETURNING {PRODUCT_COLUMNS}
            ",
        ))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_product(Vec::new()))
    }

    /// Insert a complete catalog entry (used by the seeder).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, price, image, brand, category, count_in_stock, description, rating, num_reviews)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            ",
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.count_in_stock)
        .bind(&product.description)
        .bind(product.rating)
        .bind(product.num_reviews)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_product(Vec::new()))
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        edit: &ProductEdit,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = $1, price = $2, image = $3, brand = $4, category = $5,
                count_in_stock = $6, description = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING {PRODUCT_COLUMNS}
            ",
        ))
        .bind(&edit.name)
        .bind(edit.price)
        .bind(&edit.image)
        .bind(&edit.brand)
        .bind(&edit.category)
        .bind(edit.count_in_stock)
        .bind(&edit.description)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut reviews = self.reviews_by_product(&[row.id]).await?;
        let product_reviews = reviews.remove(&row.id).unwrap_or_default();

        Ok(row.into_product(product_reviews))
    }

    /// Hard-delete a product. Its reviews go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Append a review and recompute the product's aggregates.
    ///
    /// Runs in one transaction with the product row locked: the insert and
    /// the `rating`/`num_reviews` recompute land together, and concurrent
    /// duplicate submissions lose at the `(product_id, user_id)` unique
    /// index rather than racing a pre-read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if this user already reviewed it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        author_name: &str,
        rating: Rating,
        comment: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            INSERT INTO reviews (product_id, user_id, author_name, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(author_name)
        .bind(rating)
        .bind(comment)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("product already reviewed".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let ratings: Vec<i32> = sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(&mut *tx)
            .await?;

        let (num_reviews, mean_rating) = review_aggregates(&ratings);

        sqlx::query("UPDATE products SET rating = $1, num_reviews = $2, updated_at = NOW() WHERE id = $3")
            .bind(mean_rating)
            .bind(num_reviews)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Fetch reviews for a set of products, grouped by product id.
    async fn reviews_by_product(
        &self,
        product_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<Review>>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, product_id, user_id, author_name, rating, comment, created_at
            FROM reviews
            WHERE product_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(product_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<Review>> = HashMap::new();
        for row in rows {
            grouped.entry(row.product_id).or_default().push(row.into());
        }

        Ok(grouped)
    }
}

/// Recompute review aggregates from the full rating list.
fn review_aggregates(ratings: &[i32]) -> (i32, Decimal) {
    if ratings.is_empty() {
        return (0, Decimal::ZERO);
    }

    let count = i32::try_from(ratings.len()).unwrap_or(i32::MAX);
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let mean = Decimal::from(sum) / Decimal::from(count);

    (count, mean)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_review_aggregates_empty() {
        assert_eq!(review_aggregates(&[]), (0, Decimal::ZERO));
    }

    #[test]
    fn test_review_aggregates_single() {
        assert_eq!(review_aggregates(&[4]), (1, Decimal::from(4)));
    }

    #[test]
    fn test_review_aggregates_exact_mean() {
        let (count, mean) = review_aggregates(&[4, 5]);
        assert_eq!(count, 2);
        assert_eq!(mean, "4.5".parse().unwrap());
    }

    #[test]
    fn test_review_aggregates_full_recompute() {
        let (count, mean) = review_aggregates(&[1, 2, 3, 4, 5]);
        assert_eq!(count, 5);
        assert_eq!(mean, Decimal::from(3));
    }
}
