//! Shopping cart.
//!
//! The cart is a small ordered list of `(product, variant, quantity)` lines
//! persisted as a single JSON blob under [`CART_STORAGE_KEY`]:
//!
//! ```json
//! {"items":[{"productId":"…","variantId":"…","quantity":2}]}
//! ```
//!
//! No two lines share the same [`CartKey`], and every line has a quantity of
//! at least one. [`CartStore`] maintains both properties for all mutations.

mod enrich;
mod storage;
mod store;

pub use enrich::{
    CatalogProduct, CatalogVariant, EnrichedCart, EnrichedLine, UNAVAILABLE_PRODUCT_NAME,
    enrich_cart,
};
pub use storage::{CartStorage, MemoryStorage, StorageUnavailable, UnavailableStorage};
pub use store::{CartEvent, CartStore, ListenerId};

use serde::{Deserialize, Serialize};

use crate::{ProductId, VariantId};

/// Storage key holding the serialised cart.
pub const CART_STORAGE_KEY: &str = "perkshop_cart";

/// Uniqueness key of a cart line.
pub type CartKey = (ProductId, Option<VariantId>);

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

impl CartItem {
    /// The line's uniqueness key.
    #[must_use]
    pub const fn key(&self) -> CartKey {
        (self.product_id, self.variant_id)
    }

    fn matches(&self, product_id: ProductId, variant_id: Option<VariantId>) -> bool {
        self.product_id == product_id && self.variant_id == variant_id
    }
}

/// An ordered collection of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Find the line for a key.
    #[must_use]
    pub fn find(&self, product_id: ProductId, variant_id: Option<VariantId>) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.matches(product_id, variant_id))
    }

    /// Parse a stored blob.
    ///
    /// Anything unparseable yields an empty cart. Lines are normalised on the
    /// way in: zero quantities are dropped and duplicate keys are merged into
    /// the first occurrence, so a hand-edited blob cannot break the
    /// uniqueness guarantee.
    #[must_use]
    pub fn from_json_lossy(raw: &str) -> Self {
        let Ok(parsed) = serde_json::from_str::<Self>(raw) else {
            return Self::new();
        };

        let mut cart = Self::new();
        for item in parsed.items {
            cart.merge(item.product_id, item.variant_id, item.quantity);
        }
        cart
    }

    /// Serialise to the stored JSON form.
    #[must_use]
    pub fn to_json(&self) -> String {
        // A struct of IDs and integers always serialises.
        serde_json::to_string(self).unwrap_or_else(|_| String::from(r#"{"items":[]}"#))
    }

    pub(crate) fn merge(
        &mut self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
    ) {
        if quantity == 0 {
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, variant_id))
        {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product_id,
                variant_id,
                quantity,
            });
        }
    }

    pub(crate) fn set_quantity(
        &mut self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
    ) {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if quantity == 0 {
            self.remove(product_id, variant_id);
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, variant_id))
        {
            item.quantity = quantity;
        }
    }

    pub(crate) fn remove(&mut self, product_id: ProductId, variant_id: Option<VariantId>) {
        self.items.retain(|item| !item.matches(product_id, variant_id));
    }
}
