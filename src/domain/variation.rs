use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Canonical bangle sizes in the order they are displayed.
pub const SIZE_ORDER: [&str; 4] = ["2.2", "2.4", "2.6", "2.8"];

/// A purchasable color/size combination of a product.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Variation {
    /// Identifier assigned by the store.
    pub id: i32,
    /// Owning product identifier.
    pub product_id: String,
    /// Free-text color name.
    pub color: String,
    /// Size label, normally one of [`SIZE_ORDER`].
    pub size: String,
    /// Unit price in paise.
    pub price_cents: i64,
    /// Units available for sale.
    pub stock: i32,
    /// Whether the variation is enabled for sale, independent of stock.
    pub active: bool,
}

impl Variation {
    /// Whether `other` describes the same color/size combination.
    pub fn same_options(&self, color: &str, size: &str) -> bool {
        self.color == color && self.size == size
    }
}

/// Payload required to insert a variation under a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariation {
    pub color: String,
    pub size: String,
    pub price_cents: i64,
    pub stock: i32,
    pub active: bool,
}

impl NewVariation {
    pub fn new(
        color: impl Into<String>,
        size: impl Into<String>,
        price_cents: i64,
        stock: i32,
    ) -> Self {
        Self {
            color: color.into(),
            size: size.into(),
            price_cents,
            stock,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Full replacement of a variation's editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateVariation {
    pub color: String,
    pub size: String,
    pub price_cents: i64,
    pub stock: i32,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

impl From<&Variation> for UpdateVariation {
    /// Snapshot of the current values, used to restore a variation.
    fn from(value: &Variation) -> Self {
        Self {
            color: value.color.clone(),
            size: value.size.clone(),
            price_cents: value.price_cents,
            stock: value.stock,
            active: value.active,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Position of `size` in [`SIZE_ORDER`]; unknown sizes sort last.
fn size_rank(size: &str) -> usize {
    SIZE_ORDER
        .iter()
        .position(|known| *known == size.trim())
        .unwrap_or(SIZE_ORDER.len())
}

/// Stable sort by canonical size order. Unknown sizes keep their relative order
/// after all known sizes.
pub fn sort_by_size(variations: &mut [Variation]) {
    variations.sort_by_key(|variation| size_rank(&variation.size));
}
