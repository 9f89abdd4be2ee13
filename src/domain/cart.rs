//! Session-scoped shopping cart.
//!
//! The session only keeps a [`StoredCart`]: product id, variation id and
//! quantity per line. Each request rebuilds the [`Cart`] with
//! [`Cart::restore`] from current store state, so line snapshots are fresh
//! whenever they are validated and the session cookie stays small. Lines whose
//! product or variation is gone are dropped on restore and reported by the
//! next [`Cart::validate`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::category::Category;
use crate::domain::product::Product;
use crate::domain::variation::Variation;

/// Reasons an add or update is refused. The messages are shown to shoppers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("This item is out of stock")]
    OutOfStock,
    #[error("This product variation is not available")]
    VariationUnavailable,
    #[error("Only {stock} items available in stock")]
    InsufficientStock { stock: i32 },
    #[error("Cannot add more items. Only {stock} available in stock")]
    MergeExceedsStock { stock: i32 },
    #[error("Cart item not found")]
    LineNotFound,
    #[error("Your cart can hold at most {max} different items")]
    TooManyLines { max: usize },
    #[error("Your cart is empty")]
    Empty,
    /// Validation dropped unavailable lines; the shopper has to review the cart.
    #[error("{}", REMOVED_ITEMS_NOTICE)]
    ItemsRemoved,
}

/// What the cart did with an accepted add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended.
    Added,
    /// The quantity was merged into an existing line.
    Merged,
}

impl AddOutcome {
    pub fn message(self) -> &'static str {
        match self {
            AddOutcome::Added => "Added to your cart!",
            AddOutcome::Merged => "Updated quantity in your cart!",
        }
    }
}

/// Result of checking one line against its current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    OutOfStock,
    Inactive,
    ExceedsStock { stock: i32 },
}

impl Availability {
    pub fn is_available(self) -> bool {
        matches!(self, Availability::Available)
    }

    /// Human-readable reason, `None` when the line can be bought.
    pub fn message(self) -> Option<String> {
        match self {
            Availability::Available => None,
            Availability::OutOfStock => Some("Product is out of stock".to_string()),
            Availability::Inactive => {
                Some("Product variation is no longer available".to_string())
            }
            Availability::ExceedsStock { stock } => {
                Some(format!("Only {stock} available in stock"))
            }
        }
    }
}

/// The parts of a product a cart line needs to render itself.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CartProduct {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub image: Option<String>,
}

impl From<&Product> for CartProduct {
    fn from(value: &Product) -> Self {
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
            category: value.category,
            image: value.primary_image().map(str::to_string),
        }
    }
}

/// One line of the cart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub product: CartProduct,
    pub variation: Variation,
    /// Always at least 1.
    pub quantity: i32,
}

impl CartItem {
    /// Whether this line is keyed by the same product, color and size.
    pub fn same_line(&self, product_id: &str, variation: &Variation) -> bool {
        self.product.id == product_id
            && self
                .variation
                .same_options(&variation.color, &variation.size)
    }

    pub fn line_total_cents(&self) -> i64 {
        self.variation.price_cents * i64::from(self.quantity)
    }

    /// Zero stock is reported before an inactive flag, so an empty variation
    /// always reads as out of stock.
    pub fn availability(&self) -> Availability {
        if self.variation.stock <= 0 {
            Availability::OutOfStock
        } else if !self.variation.active {
            Availability::Inactive
        } else if self.quantity > self.variation.stock {
            Availability::ExceedsStock {
                stock: self.variation.stock,
            }
        } else {
            Availability::Available
        }
    }
}

/// Distinct lines a cart may hold. Keeps the session cookie well under the
/// browser limit.
pub const MAX_CART_LINES: usize = 24;

/// Session form of one cart line.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoredLine {
    #[serde(rename = "p")]
    pub product_id: String,
    #[serde(rename = "v")]
    pub variation_id: i32,
    #[serde(rename = "q")]
    pub quantity: i32,
}

/// What the session keeps of a cart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct StoredCart {
    lines: Vec<StoredLine>,
}

impl StoredCart {
    pub fn lines(&self) -> &[StoredLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    /// Identifiers of the products referenced by the cart, without duplicates.
    pub fn product_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for line in &self.lines {
            if !ids.contains(&line.product_id.as_str()) {
                ids.push(&line.product_id);
            }
        }
        ids
    }
}

/// Ordered list of cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    /// Lines lost on restore that no validation has reported yet.
    dropped: usize,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from its session form. `products` must hold the current
    /// state of every product the stored lines reference. Lines whose product
    /// or variation is missing are dropped and counted.
    pub fn restore(stored: &StoredCart, products: &[Product]) -> Self {
        let mut cart = Cart::new();
        for line in stored.lines() {
            let current = products
                .iter()
                .find(|product| product.id == line.product_id)
                .and_then(|product| {
                    product
                        .find_variation(line.variation_id)
                        .map(|variation| (product, variation))
                });

            match current {
                Some((product, variation)) if line.quantity > 0 => {
                    cart.items.push(CartItem {
                        product: CartProduct::from(product),
                        variation: variation.clone(),
                        quantity: line.quantity,
                    });
                }
                _ => cart.dropped += 1,
            }
        }
        cart
    }

    /// Session form of the cart.
    pub fn to_stored(&self) -> StoredCart {
        StoredCart {
            lines: self
                .items
                .iter()
                .map(|item| StoredLine {
                    product_id: item.product.id.clone(),
                    variation_id: item.variation.id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }

    /// Lines dropped on restore and not yet reported by [`Cart::validate`].
    pub fn dropped_lines(&self) -> usize {
        self.dropped
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Add `quantity` units of `variation`, merging into an existing line for
    /// the same product, color and size.
    pub fn add(
        &mut self,
        product: &Product,
        variation: &Variation,
        quantity: i32,
    ) -> Result<AddOutcome, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        if variation.stock <= 0 {
            return Err(CartError::OutOfStock);
        }
        if !variation.active {
            return Err(CartError::VariationUnavailable);
        }
        if quantity > variation.stock {
            return Err(CartError::InsufficientStock {
                stock: variation.stock,
            });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.same_line(&product.id, variation))
        {
            let merged = existing.quantity.saturating_add(quantity);
            if merged > variation.stock {
                return Err(CartError::MergeExceedsStock {
                    stock: variation.stock,
                });
            }
            existing.quantity = merged;
            existing.variation = variation.clone();
            return Ok(AddOutcome::Merged);
        }
        if self.items.len() >= MAX_CART_LINES {
            return Err(CartError::TooManyLines {
                max: MAX_CART_LINES,
            });
        }

        self.items.push(CartItem {
            product: CartProduct::from(product),
            variation: variation.clone(),
            quantity,
        });
        Ok(AddOutcome::Added)
    }

    /// Remove the line at `index`. Out-of-range indexes are a no-op.
    pub fn remove(&mut self, index: usize) -> Option<CartItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Set the quantity of the line at `index`. A quantity of zero or less
    /// removes the line. Stock is not re-checked here; [`Cart::validate`]
    /// catches lines that exceed it.
    pub fn update_quantity(
        &mut self,
        index: usize,
        quantity: i32,
    ) -> Result<Option<CartItem>, CartError> {
        if index >= self.items.len() {
            return Err(CartError::LineNotFound);
        }
        if quantity <= 0 {
            return Ok(self.remove(index));
        }
        self.items[index].quantity = quantity;
        Ok(None)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.dropped = 0;
    }

    pub fn check_item_availability(item: &CartItem) -> Availability {
        item.availability()
    }

    /// Drop every unavailable line and return how many were removed.
    pub fn remove_out_of_stock_items(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.availability().is_available());
        before - self.items.len()
    }

    /// Returns `true` when every line is available and nothing was lost on
    /// restore. Otherwise the unavailable lines are removed and `false` is
    /// returned.
    pub fn validate(&mut self) -> bool {
        let dropped = std::mem::take(&mut self.dropped);
        let removed = self.remove_out_of_stock_items();
        dropped == 0 && removed == 0
    }

    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn total_price_cents(&self) -> i64 {
        self.items.iter().map(CartItem::line_total_cents).sum()
    }
}

/// Shown once when validation dropped lines from the cart.
pub const REMOVED_ITEMS_NOTICE: &str = "Out-of-stock items have been removed from your cart";
