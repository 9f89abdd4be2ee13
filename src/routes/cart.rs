use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::domain::cart::Cart;
use crate::forms::cart::{AddToCartForm, RemoveFromCartForm, UpdateCartForm};
use crate::repository::DieselRepository;
use crate::routes::{base_context, load_cart, redirect, render_template, store_cart};
use crate::services::{ServiceError, cart as cart_service};

#[get("/cart")]
pub async fn show_cart(
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

    let page = cart_service::load_cart_page(&mut cart);
    store_cart(&session, &cart);
    let mut context = base_context(&flash_messages, "cart", cart.total_items());
    context.insert("cart", &page);
    render_template(&tera, "cart/index.html", &context)
}

#[post("/cart/add")]
pub async fn add_to_cart(
    repo: web::Data<DieselRepository>,
    session: Session,
    form: web::Form<AddToCartForm>,
) -> impl Responder {
    let form = form.into_inner();
    let back = format!("/products/{}", form.product_id);

    let result = load_cart(&session, repo.get_ref()).and_then(|mut cart| {
        let outcome = cart_service::add_item(repo.get_ref(), &mut cart, form)?;
        Ok((cart, outcome))
    });

    match result {
        Ok((cart, outcome)) => {
            store_cart(&session, &cart);
            FlashMessage::success(outcome.message()).send();
            redirect(&back)
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found").send();
            redirect("/catalog")
        }
        Err(ServiceError::Cart(err)) => {
            FlashMessage::error(err.to_string()).send();
            redirect(&back)
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(&back)
        }
        Err(err) => {
            log::error!("Failed to add to cart: {err}");
            FlashMessage::error("Failed to add item to cart").send();
            redirect(&back)
        }
    }
}

#[post("/cart/update")]
pub async fn update_cart(
    repo: web::Data<DieselRepository>,
    session: Session,
    form: web::Form<UpdateCartForm>,
) -> impl Responder {
    let mut cart = match load_cart(&session, repo.get_ref()) {
        Ok(cart) => cart,
        Err(err) => return cart_unavailable(err),
    };

    match cart_service::change_quantity(&mut cart, form.into_inner()) {
        Ok(Some(removed)) => {
            store_cart(&session, &cart);
            FlashMessage::info(format!("Removed {} from your cart", removed.product.name)).send();
        }
        Ok(None) => store_cart(&session, &cart),
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
        }
    }
    redirect("/cart")
}

#[post("/cart/remove")]
pub async fn remove_from_cart(
    repo: web::Data<DieselRepository>,
    session: Session,
    form: web::Form<RemoveFromCartForm>,
) -> impl Responder {
    let mut cart = match load_cart(&session, repo.get_ref()) {
        Ok(cart) => cart,
        Err(err) => return cart_unavailable(err),
    };

    match cart_service::remove_item(&mut cart, form.index) {
        Ok(removed) => {
            store_cart(&session, &cart);
            FlashMessage::info(format!("Removed {} from your cart", removed.product.name)).send();
        }
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
        }
    }
    redirect("/cart")
}

#[post("/cart/clear")]
pub async fn clear_cart(session: Session) -> impl Responder {
    store_cart(&session, &Cart::new());
    FlashMessage::info("Your cart is now empty").send();
    redirect("/cart")
}

fn cart_unavailable(err: ServiceError) -> HttpResponse {
    log::error!("Failed to restore cart: {err}");
    FlashMessage::error("Could not load your cart, please try again").send();
    redirect("/cart")
}
