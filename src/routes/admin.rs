use actix_multipart::form::MultipartForm;
use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Serialize;
use tera::{Context, Tera};

use crate::domain::auth::AuthenticatedUser;
use crate::domain::category::Category;
use crate::domain::variation::SIZE_ORDER;
use crate::forms::products::{ActiveForm, AddVariationForm, ProductUploadForm, StockForm};
use crate::repository::DieselRepository;
use crate::routes::{base_context, cart_count, redirect, render_template};
use crate::services::admin::{self, AdminProductsQuery};
use crate::services::editor::{ProductEditor, SaveOutcome};
use crate::services::ServiceError;
use crate::storage::LocalImageStorage;

const ADMIN_HOME: &str = "/admin";

#[derive(Serialize)]
struct CategoryOption {
    value: &'static str,
    label: &'static str,
}

fn access_denied() -> HttpResponse {
    FlashMessage::error("Access denied").send();
    redirect("/login")
}

/// Message shown to the admin when a write failed.
fn failure_message(err: &ServiceError) -> String {
    match err {
        ServiceError::Form(message) | ServiceError::Conflict(message) => message.clone(),
        ServiceError::NotFound => "Product not found".to_string(),
        ServiceError::Storage(err) => format!("Failed to upload image: {err}"),
        ServiceError::Saga(err) if !err.fully_compensated() => format!(
            "Failed to save product: {err}. Some changes could not be undone, please review the product"
        ),
        ServiceError::Saga(err) => format!("Failed to save product: {err}"),
        other => {
            log::error!("Admin write failed: {other}");
            "Something went wrong, please try again".to_string()
        }
    }
}

fn editor_context(
    flash_messages: &IncomingFlashMessages,
    session: &Session,
    user: &AuthenticatedUser,
    editor: &ProductEditor,
    product_id: Option<&str>,
) -> Context {
    let mut context = base_context(flash_messages, "admin", cart_count(session));
    let categories: Vec<CategoryOption> = Category::ALL
        .into_iter()
        .map(|category| CategoryOption {
            value: category.slug(),
            label: category.label(),
        })
        .collect();

    context.insert("user", user);
    context.insert("form", editor.form());
    context.insert("images", &editor.form().images);
    context.insert("uploaded_images", &editor.uploaded_images());
    context.insert("categories", &categories);
    context.insert("sizes", &SIZE_ORDER);
    context.insert("form_error", &editor.last_error());
    match product_id {
        Some(id) => {
            context.insert("is_edit", &true);
            context.insert("form_action", &format!("/admin/products/{id}"));
            context.insert("product_id", id);
        }
        None => {
            context.insert("is_edit", &false);
            context.insert("form_action", "/admin/products");
        }
    }
    context
}

#[get("/admin")]
pub async fn show_admin_products(
    params: web::Query<AdminProductsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match admin::load_products_page(repo.get_ref(), &user, params.into_inner()) {
        Ok(page) => {
            let mut context = base_context(&flash_messages, "admin", cart_count(&session));
            context.insert("user", &user);
            context.insert("summary", &page.summary());
            context.insert("products", &page.products);
            context.insert("search", &page.search);
            render_template(&tera, "admin/index.html", &context)
        }
        Err(ServiceError::Unauthorized) => access_denied(),
        Err(err) => {
            log::error!("Failed to list admin products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/admin/products/new")]
pub async fn new_product(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match admin::open_editor(repo.get_ref(), &user, None) {
        Ok(editor) => {
            let context = editor_context(&flash_messages, &session, &user, &editor, None);
            render_template(&tera, "admin/editor.html", &context)
        }
        Err(ServiceError::Unauthorized) => access_denied(),
        Err(err) => {
            log::error!("Failed to open product editor: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/admin/products/{product_id}/edit")]
pub async fn edit_product(
    product_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match admin::open_editor(repo.get_ref(), &user, Some(product_id.as_str())) {
        Ok(editor) => {
            let context =
                editor_context(&flash_messages, &session, &user, &editor, Some(product_id.as_str()));
            render_template(&tera, "admin/editor.html", &context)
        }
        Err(ServiceError::Unauthorized) => access_denied(),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found").send();
            redirect(ADMIN_HOME)
        }
        Err(err) => {
            log::error!("Failed to open product {product_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Shared body of the create and update handlers.
#[allow(clippy::too_many_arguments)]
fn handle_save(
    product_id: Option<&str>,
    upload: ProductUploadForm,
    user: &AuthenticatedUser,
    repo: &DieselRepository,
    storage: &LocalImageStorage,
    session: &Session,
    flash_messages: &IncomingFlashMessages,
    tera: &Tera,
) -> HttpResponse {
    let back = match product_id {
        Some(id) => format!("/admin/products/{id}/edit"),
        None => "/admin/products/new".to_string(),
    };

    let (form, pending_images) = match upload.into_parts() {
        Ok(parts) => parts,
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            return redirect(&back);
        }
    };

    match admin::save_product(repo, storage, user, product_id, form, pending_images) {
        Ok(SaveOutcome::Created(product)) => {
            FlashMessage::success(format!("Product \"{}\" created", product.name)).send();
            redirect(ADMIN_HOME)
        }
        Ok(SaveOutcome::Updated(outcome)) => {
            FlashMessage::success(format!("Product \"{}\" updated", outcome.product.name)).send();
            if outcome.skipped_variations > 0 {
                FlashMessage::warning(format!(
                    "{} new variation rows were not saved. Use \"Add variation\" for new options",
                    outcome.skipped_variations
                ))
                .send();
            }
            redirect(ADMIN_HOME)
        }
        Err(failure) => match (failure.error, failure.editor) {
            (ServiceError::Unauthorized, _) => access_denied(),
            (error, Some(editor)) => {
                let mut context = editor_context(flash_messages, session, user, &editor, product_id);
                context.insert("form_error", &failure_message(&error));
                render_template(tera, "admin/editor.html", &context)
            }
            (error, None) => {
                FlashMessage::error(failure_message(&error)).send();
                redirect(ADMIN_HOME)
            }
        },
    }
}

#[post("/admin/products")]
pub async fn create_product(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    storage: web::Data<LocalImageStorage>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    MultipartForm(upload): MultipartForm<ProductUploadForm>,
) -> impl Responder {
    handle_save(
        None,
        upload,
        &user,
        repo.get_ref(),
        storage.get_ref(),
        &session,
        &flash_messages,
        &tera,
    )
}

#[post("/admin/products/{product_id}")]
pub async fn update_product(
    product_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    storage: web::Data<LocalImageStorage>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    MultipartForm(upload): MultipartForm<ProductUploadForm>,
) -> impl Responder {
    handle_save(
        Some(product_id.as_str()),
        upload,
        &user,
        repo.get_ref(),
        storage.get_ref(),
        &session,
        &flash_messages,
        &tera,
    )
}

#[post("/admin/products/{product_id}/delete")]
pub async fn delete_product(
    product_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match admin::remove_product(repo.get_ref(), &user, &product_id) {
        Ok(()) => FlashMessage::success("Product deleted").send(),
        Err(ServiceError::Unauthorized) => return access_denied(),
        Err(err) => FlashMessage::error(failure_message(&err)).send(),
    }
    redirect(ADMIN_HOME)
}

#[post("/admin/products/{product_id}/variations")]
pub async fn add_variation(
    product_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Form<AddVariationForm>,
) -> impl Responder {
    match admin::add_product_variation(repo.get_ref(), &user, &product_id, form.into_inner()) {
        Ok(variation) => FlashMessage::success(format!(
            "Added {} / {} variation",
            variation.color, variation.size
        ))
        .send(),
        Err(ServiceError::Unauthorized) => return access_denied(),
        Err(err) => FlashMessage::error(failure_message(&err)).send(),
    }
    redirect(&format!("/admin/products/{product_id}/edit"))
}

#[post("/admin/variations/{variation_id}/stock")]
pub async fn update_stock(
    variation_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Form<StockForm>,
) -> impl Responder {
    match admin::set_variation_stock(repo.get_ref(), &user, *variation_id, form.into_inner()) {
        Ok(variation) => FlashMessage::success(format!(
            "Stock for {} / {} set to {}",
            variation.color, variation.size, variation.stock
        ))
        .send(),
        Err(ServiceError::Unauthorized) => return access_denied(),
        Err(err) => FlashMessage::error(failure_message(&err)).send(),
    }
    redirect(ADMIN_HOME)
}

#[post("/admin/variations/{variation_id}/active")]
pub async fn toggle_active(
    variation_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Form<ActiveForm>,
) -> impl Responder {
    match admin::set_variation_active(repo.get_ref(), &user, *variation_id, form.into_inner()) {
        Ok(variation) => {
            let state = if variation.active { "active" } else { "inactive" };
            FlashMessage::success(format!(
                "{} / {} is now {state}",
                variation.color, variation.size
            ))
            .send();
        }
        Err(ServiceError::Unauthorized) => return access_denied(),
        Err(err) => FlashMessage::error(failure_message(&err)).send(),
    }
    redirect(ADMIN_HOME)
}
