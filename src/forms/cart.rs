use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Upper bound for a single add, well above any realistic stock.
const MAX_QUANTITY_PER_ADD: i32 = 999;

#[derive(Debug, Error)]
pub enum CartFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Posted by the "Add to cart" button on the product page.
#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartForm {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(range(min = 1))]
    pub variation_id: i32,
    #[validate(range(min = 1, max = MAX_QUANTITY_PER_ADD))]
    pub quantity: i32,
}

impl AddToCartForm {
    pub fn validated(self) -> Result<Self, CartFormError> {
        self.validate()?;
        Ok(self)
    }
}

/// Quantity change for one cart line. Zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub index: usize,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub index: usize,
}
