//! Database seeding command.
//!
//! Wipes every store table and loads the sample data set: one admin, one
//! regular customer, and a small electronics catalog attributed to the
//! admin. Intended for development and demo environments: it TRUNCATEs.

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use techshop_core::{Email, Price};

use techshop_api::db::products::{NewProduct, ProductRepository};
use techshop_api::db::users::UserRepository;
use techshop_api::services::auth::hash_password;

use super::{CommandError, database_url};

/// A user in the sample data set.
struct SeedUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    is_admin: bool,
}

/// A catalog entry in the sample data set.
struct SeedProduct {
    name: &'static str,
    image: &'static str,
    description: &'static str,
    brand: &'static str,
    category: &'static str,
    price: &'static str,
    count_in_stock: i32,
    rating: &'static str,
    num_reviews: i32,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        name: "Admin",
        email: "admin@example.com",
        password: "123456",
        is_admin: true,
    },
    SeedUser {
        name: "Customer",
        email: "customer@example.com",
        password: "123456",
        is_admin: false,
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Airpods Wireless Bluetooth Headphones",
        image: "/images/airpods.jpg",
        description: "Bluetooth technology lets you connect it with compatible devices wirelessly",
        brand: "Apple",
        category: "Electronics",
        price: "89.99",
        count_in_stock: 10,
        rating: "4.5",
        num_reviews: 12,
    },
    SeedProduct {
        name: "iPhone 13 Pro 256GB Memory",
        image: "/images/phone.jpg",
        description: "Introducing the iPhone 13 Pro. A transformative triple-camera system that adds tons of capability without complexity.",
        brand: "Apple",
        category: "Electronics",
        price: "599.99",
        count_in_stock: 7,
        rating: "4.0",
        num_reviews: 8,
    },
    SeedProduct {
        name: "Sony Playstation 5",
        image: "/images/playstation.jpg",
        description: "The ultimate home entertainment center starts with PlayStation.",
        brand: "Sony",
        category: "Electronics",
        price: "399.99",
        count_in_stock: 11,
        rating: "5",
        num_reviews: 12,
    },
    SeedProduct {
        name: "Sony Playstation 4",
        image: "/images/playstation.jpg",
        description: "The ultimate home entertainment center starts with PlayStation.",
        brand: "Sony",
        category: "Electronics",
        price: "299.99",
        count_in_stock: 11,
        rating: "5",
        num_reviews: 12,
    },
];

/// Wipe the store and load the sample data set.
///
/// # Errors
///
/// Returns an error if the database is unreachable, a seed value fails to
/// parse, or any insert fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    info!("Wiping store tables...");
    sqlx::query("TRUNCATE orders, order_items, reviews, products, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await?;

    seed_users(&pool).await?;
    seed_products(&pool).await?;

    info!("Data imported successfully!");
    Ok(())
}

async fn seed_users(pool: &PgPool) -> Result<(), CommandError> {
    let users = UserRepository::new(pool);

    for seed in USERS {
        let email = Email::parse(seed.email)
            .map_err(|e| CommandError::InvalidSeedData(e.to_string()))?;
        let password_hash = hash_password(seed.password)?;

        let user = users
            .create(seed.name, &email, &password_hash, seed.is_admin)
            .await?;
        info!(user_id = %user.id, email = %user.email, admin = user.is_admin, "seeded user");
    }

    Ok(())
}

async fn seed_products(pool: &PgPool) -> Result<(), CommandError> {
    let products = ProductRepository::new(pool);

    for seed in PRODUCTS {
        let price = seed
            .price
            .parse::<Decimal>()
            .ok()
            .and_then(|d| Price::parse(d).ok())
            .ok_or_else(|| CommandError::InvalidSeedData(format!("bad price: {}", seed.price)))?;
        let rating = seed
            .rating
            .parse::<Decimal>()
            .map_err(|e| CommandError::InvalidSeedData(e.to_string()))?;

        let product = products
            .insert(&NewProduct {
                name: seed.name.to_owned(),
                price,
                image: seed.image.to_owned(),
                brand: seed.brand.to_owned(),
                category: seed.category.to_owned(),
                count_in_stock: seed.count_in_stock,
                description: seed.description.to_owned(),
                rating,
                num_reviews: seed.num_reviews,
            })
            .await?;
        info!(product_id = %product.id, name = %product.name, "seeded product");
    }

    Ok(())
}
