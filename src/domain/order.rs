//! Plain-text order summary handed off to WhatsApp.
//!
//! No order record is stored. The summary is the only artefact of a checkout.

use crate::domain::cart::Cart;
use crate::domain::price::format_price;

/// Base of the WhatsApp click-to-chat deep link.
pub const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Contact details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    /// Digits only.
    pub phone: String,
    pub address: String,
    pub notes: Option<String>,
}

/// One itemised line of the order message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Snapshot of a cart and the customer placing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub lines: Vec<OrderLine>,
    pub subtotal_cents: i64,
    pub customer: CustomerDetails,
}

impl OrderSummary {
    pub fn new(cart: &Cart, customer: CustomerDetails) -> Self {
        let lines = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_name: item.product.name.clone(),
                color: item.variation.color.clone(),
                size: item.variation.size.clone(),
                quantity: item.quantity,
                unit_price_cents: item.variation.price_cents,
                line_total_cents: item.line_total_cents(),
            })
            .collect();

        Self {
            lines,
            subtotal_cents: cart.total_price_cents(),
            customer,
        }
    }

    /// Render the message body sent to the shop.
    pub fn message(&self) -> String {
        let mut text = String::from("Hello! I would like to place an order:\n\n");

        for (index, line) in self.lines.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} ({}, size {})\n   Qty: {} x {} = {}\n",
                index + 1,
                line.product_name,
                line.color,
                line.size,
                line.quantity,
                format_price(line.unit_price_cents),
                format_price(line.line_total_cents),
            ));
        }

        text.push_str(&format!(
            "\nSubtotal: {}\n",
            format_price(self.subtotal_cents)
        ));
        text.push_str(&format!("\nName: {}\n", self.customer.name));
        text.push_str(&format!("Phone: {}\n", self.customer.phone));
        text.push_str(&format!("Address: {}", self.customer.address));
        if let Some(notes) = &self.customer.notes {
            text.push_str(&format!("\nNotes: {notes}"));
        }

        text
    }
}

/// Deep link that opens a chat with `phone_digits` pre-filled with `message`.
pub fn whatsapp_link(phone_digits: &str, message: &str) -> String {
    format!(
        "{WHATSAPP_BASE_URL}/{phone_digits}?text={}",
        urlencoding::encode(message)
    )
}
