//! HTTP handlers and the helpers they share.

use std::collections::HashMap;
use std::future::{Ready, ready};

use actix_identity::IdentityExt;
use actix_session::Session;
use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::domain::auth::AuthenticatedUser;
use crate::domain::cart::{Cart, REMOVED_ITEMS_NOTICE, StoredCart};
use crate::domain::price::format_price;
use crate::repository::ProductReader;
use crate::services::{ServiceResult, cart as cart_service};

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod main;

/// Session key the cart is stored under.
pub const CART_SESSION_KEY: &str = "cart";

/// Where unauthenticated admin requests are sent.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Serialize)]
struct Alert {
    level: &'static str,
    message: String,
}

fn alert_level(level: Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        Level::Info | Level::Debug => "info",
    }
}

/// `{{ cents | price }}` renders an amount in paise as `₹180.00`.
fn price_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let cents = value
        .as_i64()
        .ok_or_else(|| tera::Error::msg(format!("price filter expects an integer, got {value}")))?;
    Ok(Value::String(format_price(cents)))
}

/// Register the custom filters every template may use.
pub fn register_filters(tera: &mut Tera) {
    tera.register_filter("price", price_filter);
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// 404 page. `missing` names what was looked up, when known.
pub fn render_not_found(tera: &Tera, mut context: Context, missing: Option<&str>) -> HttpResponse {
    context.insert("missing", &missing);
    match tera.render("main/not_found.html", &context) {
        Ok(body) => HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render 404 page: {err}");
            HttpResponse::NotFound().body("page not found")
        }
    }
}

/// Context every page starts from: flash alerts, the active navigation entry
/// and the cart badge.
pub fn base_context(
    flash_messages: &IncomingFlashMessages,
    current_page: &str,
    cart_count: i64,
) -> Context {
    let alerts: Vec<Alert> = flash_messages
        .iter()
        .map(|message| Alert {
            level: alert_level(message.level()),
            message: message.content().to_string(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_page", current_page);
    context.insert("cart_count", &cart_count);
    context
}

/// Cart lines kept in the session, or none. Lines that no longer deserialize
/// are discarded.
pub fn load_stored_cart(session: &Session) -> StoredCart {
    match session.get::<StoredCart>(CART_SESSION_KEY) {
        Ok(Some(stored)) => stored,
        Ok(None) => StoredCart::default(),
        Err(err) => {
            log::warn!("Discarding unreadable cart session: {err}");
            session.remove(CART_SESSION_KEY);
            StoredCart::default()
        }
    }
}

/// Units in the session cart, for the navigation badge.
pub fn cart_count(session: &Session) -> i64 {
    load_stored_cart(session).total_items()
}

/// Session cart rebuilt from the current store state.
pub fn load_cart<R>(session: &Session, repo: &R) -> ServiceResult<Cart>
where
    R: ProductReader + ?Sized,
{
    cart_service::restore_cart(repo, &load_stored_cart(session))
}

/// Write the cart back to the session. Lines dropped on restore that no
/// validation reported are announced here.
pub fn store_cart(session: &Session, cart: &Cart) {
    if cart.dropped_lines() > 0 {
        FlashMessage::warning(REMOVED_ITEMS_NOTICE).send();
    }
    if let Err(err) = session.insert(CART_SESSION_KEY, cart.to_stored()) {
        log::error!("Failed to store cart in session: {err}");
        FlashMessage::error("Could not save your cart, please try again").send();
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .get_identity()
            .ok()
            .and_then(|identity| identity.id().ok())
            .and_then(|raw| serde_json::from_str::<AuthenticatedUser>(&raw).ok());

        ready(match user {
            Some(user) => Ok(user),
            None => Err(InternalError::from_response(
                "authentication required",
                redirect(LOGIN_PATH),
            )
            .into()),
        })
    }
}
