//! Cart line types shared between the guest and remote cart backends.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CartItemId, Product, ProductId, VariantId};

/// Reference to the product a cart line is for.
///
/// Guest carts embed a full product snapshot so lines can be priced and
/// displayed offline; the remote cart returns the same shape after
/// resolving the reference server-side. A bare id appears only in lines
/// restored from older persisted snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Snapshot(Box<Product>),
    Id(ProductId),
}

impl ProductRef {
    /// The referenced product's id, whichever form the reference takes.
    #[must_use]
    pub fn id(&self) -> ProductId {
        match self {
            Self::Snapshot(product) => product.id,
            Self::Id(id) => *id,
        }
    }

    /// The embedded snapshot, when one is present.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&Product> {
        match self {
            Self::Snapshot(product) => Some(product),
            Self::Id(_) => None,
        }
    }
}

impl From<Product> for ProductRef {
    fn from(product: Product) -> Self {
        Self::Snapshot(Box::new(product))
    }
}

/// One line of the cart.
///
/// Lines are unique per (product, variant) pair. `id` is the remote cart
/// row id and is absent for guest lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub id: Option<CartItemId>,
    pub product: ProductRef,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

impl CartItem {
    /// The uniqueness key for merging lines.
    #[must_use]
    pub fn key(&self) -> (ProductId, Option<VariantId>) {
        (self.product.id(), self.variant_id)
    }

    /// True when this line is for the given (product, variant) pair.
    #[must_use]
    pub fn matches(&self, product: ProductId, variant: Option<VariantId>) -> bool {
        self.key() == (product, variant)
    }

    /// Effective per-unit price, zero when no snapshot is available.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.product
            .snapshot()
            .map_or(Decimal::ZERO, Product::effective_price)
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}
