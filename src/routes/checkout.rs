use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::config::ServerConfig;
use crate::forms::checkout::CheckoutForm;
use crate::repository::DieselRepository;
use crate::routes::{base_context, load_cart, redirect, render_template, store_cart};
use crate::services::cart::CartPage;
use crate::services::{ServiceError, checkout};

#[get("/checkout")]
pub async fn show_checkout(
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut cart = match load_cart(&session, repo.get_ref()) {
        Ok(cart) => cart,
        Err(err) => {
            log::error!("Failed to restore cart: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };
    let result = checkout::load_checkout_page(&mut cart);
    store_cart(&session, &cart);

    match result {
        Ok(page) => {
            let mut context = base_context(&flash_messages, "checkout", cart.total_items());
            context.insert("cart", &page);
            context.insert("form", &CheckoutForm::default());
            render_template(&tera, "checkout/index.html", &context)
        }
        Err(ServiceError::Cart(err)) => {
            FlashMessage::warning(err.to_string()).send();
            redirect("/cart")
        }
        Err(err) => {
            log::error!("Failed to load checkout: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/checkout")]
pub async fn place_order(
    repo: web::Data<DieselRepository>,
    session: Session,
    form: web::Form<CheckoutForm>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let form = form.into_inner();
    let mut cart = match load_cart(&session, repo.get_ref()) {
        Ok(cart) => cart,
        Err(err) => {
            log::error!("Failed to restore cart: {err}");
            FlashMessage::error("Could not place your order, please try again").send();
            return redirect("/checkout");
        }
    };

    let result = checkout::place_order(&mut cart, form.clone(), &server_config.whatsapp_number);
    store_cart(&session, &cart);

    match result {
        Ok(handoff) => redirect(&handoff.link),
        Err(ServiceError::Cart(err)) => {
            FlashMessage::warning(err.to_string()).send();
            redirect("/cart")
        }
        Err(ServiceError::Form(message)) => {
            // Re-render so the shopper keeps what they typed.
            let page = CartPage::build(&cart, false);
            let mut context = base_context(&flash_messages, "checkout", cart.total_items());
            context.insert("cart", &page);
            context.insert("form", &form);
            context.insert("form_error", &message);
            render_template(&tera, "checkout/index.html", &context)
        }
        Err(err) => {
            log::error!("Failed to place order: {err}");
            FlashMessage::error("Could not place your order, please try again").send();
            redirect("/checkout")
        }
    }
}
