use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use crate::repository::DieselRepository;
use crate::routes::{base_context, cart_count, render_not_found, render_template};
use crate::services::ServiceError;
use crate::services::catalog::{self, CatalogQuery};

#[get("/catalog")]
pub async fn show_catalog(
    params: web::Query<CatalogQuery>,
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match catalog::load_catalog(repo.get_ref(), &params) {
        Ok(page) => {
            let mut context = base_context(&flash_messages, "catalog", cart_count(&session));
            context.insert("products", &page.products);
            context.insert("total", &page.total);
            context.insert("search", &page.search);
            context.insert("categories", &page.categories);
            context.insert("sorts", &page.sorts);
            render_template(&tera, "catalog/index.html", &context)
        }
        Err(err) => {
            log::error!("Failed to list catalog: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/products/{product_id}")]
pub async fn show_product(
    product_id: web::Path<String>,
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match catalog::load_product_page(repo.get_ref(), &product_id) {
        Ok(page) => {
            let mut context = base_context(&flash_messages, "catalog", cart_count(&session));
            context.insert("product", &page.product);
            context.insert("category_label", page.category_label);
            context.insert("variations", &page.variations);
            context.insert("colors", &page.colors);
            context.insert("related", &page.related);
            render_template(&tera, "catalog/product.html", &context)
        }
        Err(ServiceError::NotFound) => {
            log::info!("Product {product_id} not found");
            let context = base_context(&flash_messages, "catalog", cart_count(&session));
            render_not_found(&tera, context, Some("product"))
        }
        Err(err) => {
            log::error!("Failed to load product {product_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
