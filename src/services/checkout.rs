//! Checkout: validated cart plus contact details turned into a WhatsApp
//! hand-off link.

use crate::domain::cart::{Cart, CartError};
use crate::domain::order::{OrderSummary, whatsapp_link};
use crate::forms::checkout::CheckoutForm;
use crate::services::cart::{CartPage, validate_cart};
use crate::services::{ServiceError, ServiceResult};

/// Everything the browser needs to leave for WhatsApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHandoff {
    pub summary: OrderSummary,
    pub message: String,
    pub link: String,
}

/// Cart shown next to the checkout form. An empty cart cannot check out.
///
/// `cart` must have been restored from the store in the same request.
pub fn load_checkout_page(cart: &mut Cart) -> ServiceResult<CartPage> {
    let removed = validate_cart(cart);
    if cart.is_empty() {
        return Err(if removed {
            CartError::ItemsRemoved
        } else {
            CartError::Empty
        }
        .into());
    }
    Ok(CartPage::build(cart, removed))
}

/// Validate the restored cart and the form, build the summary and empty the
/// cart. Nothing is cleared when any step fails.
pub fn place_order(
    cart: &mut Cart,
    form: CheckoutForm,
    shop_phone: &str,
) -> ServiceResult<OrderHandoff> {
    if validate_cart(cart) {
        return Err(CartError::ItemsRemoved.into());
    }
    if cart.is_empty() {
        return Err(CartError::Empty.into());
    }

    let customer = form
        .into_customer_details()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let summary = OrderSummary::new(cart, customer);
    let message = summary.message();
    let link = whatsapp_link(shop_phone, &message);

    log::info!(
        "Handing off order of {} lines ({} cents) to WhatsApp",
        summary.lines.len(),
        summary.subtotal_cents
    );
    cart.clear();

    Ok(OrderHandoff {
        summary,
        message,
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::product::Product;
    use crate::domain::variation::Variation;
    use chrono::NaiveDateTime;

    fn product(stock: i32) -> Product {
        Product {
            id: "pearl-white-1".to_string(),
            name: "Pearl White".to_string(),
            description: "Pearls".to_string(),
            images: vec!["/uploads/products/pearl.jpg".to_string()],
            category: Category::Pearl,
            featured: true,
            variations: vec![Variation {
                id: 4,
                product_id: "pearl-white-1".to_string(),
                color: "White".to_string(),
                size: "2.4".to_string(),
                price_cents: 18000,
                stock,
                active: true,
            }],
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    /// Two units added earlier, restored against a store holding `stock`.
    fn restored_cart(stock: i32) -> Cart {
        let mut cart = Cart::new();
        let stocked = product(5);
        cart.add(&stocked, &stocked.variations[0], 2)
            .expect("line added");
        Cart::restore(&cart.to_stored(), &[product(stock)])
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Asha".to_string(),
            phone: "98765 43210".to_string(),
            confirm_phone: "9876543210".to_string(),
            address: "12 MG Road\nPune".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn place_order_builds_link_and_clears_cart() {
        let mut cart = restored_cart(5);

        let handoff = place_order(&mut cart, form(), "919000000000").expect("expected success");

        assert!(handoff.link.starts_with("https://wa.me/919000000000?text="));
        assert!(handoff.message.contains("1. Pearl White (White, size 2.4)"));
        assert!(handoff.message.contains("Qty: 2 x ₹180.00 = ₹360.00"));
        assert!(handoff.message.contains("Phone: 9876543210"));
        assert!(cart.is_empty());
    }

    #[test]
    fn place_order_keeps_cart_on_invalid_form() {
        let mut cart = restored_cart(5);
        let mut bad = form();
        bad.confirm_phone = "9876500000".to_string();

        let result = place_order(&mut cart, bad, "919000000000");

        assert!(matches!(result, Err(ServiceError::Form(ref msg)) if msg == "Phone numbers do not match"));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn place_order_stops_when_stock_ran_out() {
        let mut cart = restored_cart(1);

        let result = place_order(&mut cart, form(), "919000000000");

        assert!(matches!(
            result,
            Err(ServiceError::Cart(CartError::ItemsRemoved))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn place_order_stops_when_product_was_deleted() {
        let mut cart = Cart::new();
        let stocked = product(5);
        cart.add(&stocked, &stocked.variations[0], 1)
            .expect("line added");
        let mut cart = Cart::restore(&cart.to_stored(), &[]);

        let result = place_order(&mut cart, form(), "919000000000");

        assert!(matches!(
            result,
            Err(ServiceError::Cart(CartError::ItemsRemoved))
        ));
    }

    #[test]
    fn checkout_page_requires_items() {
        let mut cart = Cart::new();

        let result = load_checkout_page(&mut cart);

        assert!(matches!(result, Err(ServiceError::Cart(CartError::Empty))));
    }
}
