//! Client-side shopping cart store.
//!
//! The cart never touches the server until checkout: clients keep it in
//! durable local storage and submit it whole as an order. This module gives
//! that state an explicit schema and a single hydrate/persist boundary
//! instead of ad-hoc JSON blobs scattered through the frontend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Email, Price, ProductId, UserId};

/// Durable storage key under which clients persist the serialized cart.
pub const STORAGE_KEY: &str = "techshop.cart";

/// Durable storage key under which clients persist the signed-in identity.
pub const IDENTITY_STORAGE_KEY: &str = "techshop.user";

/// One line of the cart: a snapshot of a catalog product at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Catalog product this line snapshots.
    pub product: ProductId,
    /// Product name at add time.
    pub name: String,
    /// Product image at add time.
    pub image: String,
    /// Unit price at add time.
    pub price: Price,
    /// Units of this product.
    pub qty: u32,
}

/// Shipping destination captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// The full client-side cart state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart lines in insertion order.
    pub items: Vec<CartLine>,
    /// Destination, once the shipping step has been completed.
    pub shipping_address: Option<ShippingAddress>,
}

/// Errors crossing the hydrate/persist boundary.
#[derive(thiserror::Error, Debug)]
pub enum CartStoreError {
    /// The stored blob is not a valid serialized cart.
    #[error("stored cart is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl Cart {
    /// Rebuild a cart from its persisted form.
    ///
    /// `None` (nothing stored yet) yields an empty cart, matching a first
    /// visit.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Corrupt`] if the stored blob does not
    /// deserialize.
    pub fn hydrate(stored: Option<&str>) -> Result<Self, CartStoreError> {
        match stored {
            Some(blob) => Ok(serde_json::from_str(blob)?),
            None => Ok(Self::default()),
        }
    }

    /// Serialize the cart for durable storage under [`STORAGE_KEY`].
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Corrupt`] if serialization fails.
    pub fn persist(&self) -> Result<String, CartStoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Add a line, replacing any existing line for the same product.
    pub fn upsert_line(&mut self, line: CartLine) {
        match self.items.iter_mut().find(|l| l.product == line.product) {
            Some(existing) => *existing = line,
            None => self.items.push(line),
        }
    }

    /// Remove the line for a product, if present.
    pub fn remove_line(&mut self, product: ProductId) {
        self.items.retain(|l| l.product != product);
    }

    /// Empty the cart (after a successful checkout).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price * qty` over all lines.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|l| l.price.times(l.qty)).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The signed-in identity as clients persist it between visits, under
/// [`IDENTITY_STORAGE_KEY`].
///
/// Logout clears the stored value entirely, so hydrating nothing yields
/// `None` rather than an empty identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentity {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub is_admin: bool,
    /// Bearer token presented on authenticated requests.
    pub token: String,
}

impl StoredIdentity {
    /// Rebuild the signed-in identity from its persisted form, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Corrupt`] if the stored blob does not
    /// deserialize.
    pub fn hydrate(stored: Option<&str>) -> Result<Option<Self>, CartStoreError> {
        stored
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }

    /// Serialize the identity for durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`CartStoreError::Corrupt`] if serialization fails.
    pub fn persist(&self) -> Result<String, CartStoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price: &str, qty: u32) -> CartLine {
        CartLine {
            product: ProductId::new(id),
            name: format!("product-{id}"),
            image: "/images/sample.jpg".to_owned(),
            price: Price::parse(price.parse().unwrap()).unwrap(),
            qty,
        }
    }

    #[test]
    fn test_hydrate_nothing_stored() {
        let cart = Cart::hydrate(None).unwrap();
        assert!(cart.is_empty());
        assert!(cart.shipping_address.is_none());
    }

    #[test]
    fn test_hydrate_rejects_corrupt_blob() {
        assert!(matches!(
            Cart::hydrate(Some("not json")),
            Err(CartStoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_persist_roundtrip() {
        let mut cart = Cart::default();
        cart.upsert_line(line(1, "89.99", 2));
        cart.shipping_address = Some(ShippingAddress {
            address: "1 Main St".to_owned(),
            city: "Springfield".to_owned(),
            postal_code: "12345".to_owned(),
            country: "USA".to_owned(),
        });

        let blob = cart.persist().unwrap();
        let back = Cart::hydrate(Some(&blob)).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_upsert_replaces_same_product() {
        let mut cart = Cart::default();
        cart.upsert_line(line(1, "89.99", 1));
        cart.upsert_line(line(2, "599.99", 1));
        cart.upsert_line(line(1, "89.99", 3));

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items.first().unwrap().qty, 3);
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::default();
        cart.upsert_line(line(1, "89.99", 1));
        cart.upsert_line(line(2, "599.99", 1));
        cart.remove_line(ProductId::new(1));

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items.first().unwrap().product, ProductId::new(2));
    }

    #[test]
    fn test_items_total() {
        let mut cart = Cart::default();
        cart.upsert_line(line(1, "89.99", 2));
        cart.upsert_line(line(2, "599.99", 1));

        assert_eq!(cart.items_total(), "779.97".parse().unwrap());
    }

    #[test]
    fn test_identity_hydrate_nothing_stored() {
        assert_eq!(StoredIdentity::hydrate(None).unwrap(), None);
    }

    #[test]
    fn test_identity_persist_roundtrip() {
        let identity = StoredIdentity {
            id: UserId::new(3),
            name: "Customer".to_owned(),
            email: Email::parse("customer@example.com").unwrap(),
            is_admin: false,
            token: "opaque-bearer-token".to_owned(),
        };

        let blob = identity.persist().unwrap();
        let back = StoredIdentity::hydrate(Some(&blob)).unwrap();
        assert_eq!(back, Some(identity));
    }

    #[test]
    fn test_clear_keeps_shipping_address() {
        let mut cart = Cart::default();
        cart.upsert_line(line(1, "89.99", 1));
        cart.shipping_address = Some(ShippingAddress {
            address: "1 Main St".to_owned(),
            city: "Springfield".to_owned(),
            postal_code: "12345".to_owned(),
            country: "USA".to_owned(),
        });

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.shipping_address.is_some());
    }
}
