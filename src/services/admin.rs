//! Admin dashboard operations. Every entry point requires [`ADMIN_ROLE`].

use serde::Deserialize;

use crate::ADMIN_ROLE;
use crate::domain::auth::{AuthenticatedUser, check_role};
use crate::domain::product::{Product, ProductListQuery};
use crate::domain::variation::Variation;
use crate::forms::products::{ActiveForm, AddVariationForm, ProductForm, StockForm};
use crate::repository::{ProductReader, ProductWriter, VariationWriter};
use crate::services::editor::{ProductEditor, SaveOutcome};
use crate::services::products;
use crate::services::{ServiceError, ServiceResult};
use crate::storage::{ImageStorage, PendingImage};

/// Query parameters accepted by the admin products page.
#[derive(Debug, Default, Deserialize)]
pub struct AdminProductsQuery {
    pub search: Option<String>,
}

/// Data required to render the admin products table.
pub struct AdminProductsPage {
    pub products: Vec<Product>,
    /// Number of products in the store, regardless of the search.
    pub total: usize,
    pub search: Option<String>,
}

impl AdminProductsPage {
    /// "Showing N of M products".
    pub fn summary(&self) -> String {
        format!("Showing {} of {} products", self.products.len(), self.total)
    }
}

/// A save that did not go through. `editor` carries the form as the admin left
/// it when the failure happened after the editor was opened.
#[derive(Debug)]
pub struct SaveFailure {
    pub error: ServiceError,
    pub editor: Option<Box<ProductEditor>>,
}

impl From<ServiceError> for SaveFailure {
    fn from(error: ServiceError) -> Self {
        Self {
            error,
            editor: None,
        }
    }
}

fn ensure_admin(user: &AuthenticatedUser) -> ServiceResult<()> {
    if check_role(ADMIN_ROLE, &user.roles) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

pub fn load_products_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: AdminProductsQuery,
) -> ServiceResult<AdminProductsPage>
where
    R: ProductReader + ?Sized,
{
    ensure_admin(user)?;

    let search = query
        .search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty());

    let all = products::fetch_all(repo)?;
    let total = all.len();
    let products = match &search {
        Some(term) => repo.list_products(ProductListQuery::new().search(term.clone()))?,
        None => all,
    };

    Ok(AdminProductsPage {
        products,
        total,
        search,
    })
}

/// Editor for a new product, or for `product_id` when given.
pub fn open_editor<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: Option<&str>,
) -> ServiceResult<ProductEditor>
where
    R: ProductReader + ?Sized,
{
    ensure_admin(user)?;

    match product_id {
        None => Ok(ProductEditor::open_create()),
        Some(id) => {
            let product = products::fetch_by_id(repo, id)?.ok_or(ServiceError::NotFound)?;
            Ok(ProductEditor::open_edit(product))
        }
    }
}

/// Run one editor submission with the posted form and files.
pub fn save_product<R, S>(
    repo: &R,
    storage: &S,
    user: &AuthenticatedUser,
    product_id: Option<&str>,
    form: ProductForm,
    pending_images: Vec<PendingImage>,
) -> Result<SaveOutcome, SaveFailure>
where
    R: ProductReader + ProductWriter + VariationWriter + ?Sized,
    S: ImageStorage + ?Sized,
{
    let mut editor = open_editor(repo, user, product_id)?;
    editor.set_form(form);
    for image in pending_images {
        editor.attach_image(image);
    }

    editor.submit(repo, storage).map_err(|error| {
        log::warn!("Product save rejected: {error}");
        SaveFailure {
            error,
            editor: Some(Box::new(editor.clone())),
        }
    })
}

pub fn remove_product<R>(repo: &R, user: &AuthenticatedUser, product_id: &str) -> ServiceResult<()>
where
    R: ProductWriter + VariationWriter + ?Sized,
{
    ensure_admin(user)?;
    products::delete_product(repo, product_id)
}

pub fn set_variation_stock<R>(
    repo: &R,
    user: &AuthenticatedUser,
    variation_id: i32,
    form: StockForm,
) -> ServiceResult<Variation>
where
    R: VariationWriter + ?Sized,
{
    ensure_admin(user)?;
    products::update_variation_stock(repo, variation_id, form.stock)
}

pub fn set_variation_active<R>(
    repo: &R,
    user: &AuthenticatedUser,
    variation_id: i32,
    form: ActiveForm,
) -> ServiceResult<Variation>
where
    R: VariationWriter + ?Sized,
{
    ensure_admin(user)?;
    products::update_variation_active(repo, variation_id, form.active)
}

pub fn add_product_variation<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: &str,
    form: AddVariationForm,
) -> ServiceResult<Variation>
where
    R: ProductReader + VariationWriter + ?Sized,
{
    ensure_admin(user)?;
    let new_variation = form
        .into_new_variation()
        .map_err(|err| ServiceError::Form(err.to_string()))?;
    products::add_variation(repo, product_id, &new_variation)
}
