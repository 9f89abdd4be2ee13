use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use crate::repository::DieselRepository;
use crate::routes::{base_context, cart_count, render_not_found, render_template};
use crate::services::catalog;

#[get("/")]
pub async fn show_index(
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match catalog::load_home(repo.get_ref()) {
        Ok(page) => {
            let mut context = base_context(&flash_messages, "home", cart_count(&session));
            context.insert("featured", &page.featured);
            context.insert("categories", &page.categories);
            render_template(&tera, "main/index.html", &context)
        }
        Err(err) => {
            log::error!("Failed to load featured products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

/// Fallback for every unmatched path.
pub async fn not_found(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> HttpResponse {
    let context = base_context(&flash_messages, "", cart_count(&session));
    render_not_found(&tera, context, None)
}
