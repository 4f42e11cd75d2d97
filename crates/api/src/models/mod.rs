//! Domain models.
//!
//! These are the validated domain objects handlers work with, separate from
//! the database row types in [`crate::db`]. They serialize straight to the
//! wire shapes the REST surface documents.

pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, PaymentResult};
pub use product::{Product, Review};
pub use user::User;
