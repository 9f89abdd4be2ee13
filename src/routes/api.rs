use actix_web::{HttpResponse, Responder, get, web};

use crate::repository::DieselRepository;
use crate::services::catalog::{self, CatalogQuery};

#[get("/v1/products")]
/// Return the catalog as JSON, filtered and sorted like the catalog page.
pub async fn api_v1_products(
    params: web::Query<CatalogQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match catalog::list_catalog(repo.get_ref(), &params) {
        Ok(products) => HttpResponse::Ok().json(products),
        Err(err) => {
            log::error!("Failed to list products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
