use serde::Serialize;

use crate::domain::cart::{
    AddOutcome, Cart, CartError, CartItem, REMOVED_ITEMS_NOTICE, StoredCart,
};
use crate::domain::price::format_price;
use crate::forms::cart::{AddToCartForm, UpdateCartForm};
use crate::repository::ProductReader;
use crate::services::{ServiceError, ServiceResult};

/// One cart line prepared for the template.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CartLineView {
    pub index: usize,
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub stock: i32,
    pub unit_price: String,
    pub line_total: String,
    /// Reason the line cannot be bought, if any.
    pub problem: Option<String>,
}

impl CartLineView {
    fn new(index: usize, item: &CartItem) -> Self {
        Self {
            index,
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            category: item.product.category.label().to_string(),
            image: item.product.image.clone(),
            color: item.variation.color.clone(),
            size: item.variation.size.clone(),
            quantity: item.quantity,
            stock: item.variation.stock,
            unit_price: format_price(item.variation.price_cents),
            line_total: format_price(item.line_total_cents()),
            problem: item.availability().message(),
        }
    }
}

/// Cart contents after a refresh against the store.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CartPage {
    pub lines: Vec<CartLineView>,
    pub total_items: i64,
    pub subtotal_cents: i64,
    pub subtotal: String,
    /// Set when the refresh removed unavailable lines.
    pub notice: Option<&'static str>,
}

impl CartPage {
    pub fn build(cart: &Cart, removed: bool) -> Self {
        Self {
            lines: cart
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| CartLineView::new(index, item))
                .collect(),
            total_items: cart.total_items(),
            subtotal_cents: cart.total_price_cents(),
            subtotal: format_price(cart.total_price_cents()),
            notice: removed.then_some(REMOVED_ITEMS_NOTICE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Look the variation up in the store and add it to `cart`.
pub fn add_item<R>(repo: &R, cart: &mut Cart, form: AddToCartForm) -> ServiceResult<AddOutcome>
where
    R: ProductReader + ?Sized,
{
    if form.quantity < 1 {
        return Err(CartError::InvalidQuantity.into());
    }
    let form = form.validated().map_err(|err| {
        log::debug!("Rejected add-to-cart payload: {err}");
        ServiceError::Form("Invalid cart request".to_string())
    })?;

    let product = repo
        .get_product_by_id(&form.product_id)?
        .ok_or(ServiceError::NotFound)?;
    let variation = product
        .find_variation(form.variation_id)
        .ok_or(CartError::VariationUnavailable)?;

    Ok(cart.add(&product, variation, form.quantity)?)
}

/// Returns the removed line when the new quantity dropped it.
pub fn change_quantity(cart: &mut Cart, form: UpdateCartForm) -> ServiceResult<Option<CartItem>> {
    Ok(cart.update_quantity(form.index, form.quantity)?)
}

pub fn remove_item(cart: &mut Cart, index: usize) -> ServiceResult<CartItem> {
    cart.remove(index)
        .ok_or(ServiceError::Cart(CartError::LineNotFound))
}

/// Rebuild the session cart from the current state of every product it
/// references.
pub fn restore_cart<R>(repo: &R, stored: &StoredCart) -> ServiceResult<Cart>
where
    R: ProductReader + ?Sized,
{
    let mut products = Vec::new();
    for product_id in stored.product_ids() {
        if let Some(product) = repo.get_product_by_id(product_id)? {
            products.push(product);
        }
    }

    let cart = Cart::restore(stored, &products);
    if cart.dropped_lines() > 0 {
        log::info!(
            "Dropped {} cart lines whose product is gone",
            cart.dropped_lines()
        );
    }
    Ok(cart)
}

/// Drop unavailable lines. Returns `true` when lines were removed.
pub fn validate_cart(cart: &mut Cart) -> bool {
    let removed = !cart.validate();
    if removed {
        log::info!("Removed unavailable lines from a cart");
    }
    removed
}

/// Validate a restored cart and prepare it for display.
pub fn load_cart_page(cart: &mut Cart) -> CartPage {
    let removed = validate_cart(cart);
    CartPage::build(cart, removed)
}
