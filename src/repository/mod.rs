use crate::db::{DbConnection, DbPool};
use crate::domain::product::{NewProduct, Product, ProductListQuery, UpdateProduct};
use crate::domain::variation::{NewVariation, UpdateVariation, Variation};

pub mod errors;
pub mod product;
pub mod variation;

#[cfg(test)]
pub mod mock;

pub use errors::{RepositoryError, RepositoryResult};

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over product records. Returned products carry their
/// variations.
pub trait ProductReader {
    fn get_product_by_id(&self, id: &str) -> RepositoryResult<Option<Product>>;
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<Product>>;
}

/// Write operations over the `products` table only. Variation rows are written
/// through [`VariationWriter`].
pub trait ProductWriter {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
    fn update_product(&self, product_id: &str, updates: &UpdateProduct)
    -> RepositoryResult<Product>;
    fn delete_product(&self, product_id: &str) -> RepositoryResult<()>;
}

/// Read-only operations over variation records.
pub trait VariationReader {
    fn get_variation_by_id(&self, id: i32) -> RepositoryResult<Option<Variation>>;
    fn list_variations(&self, product_id: &str) -> RepositoryResult<Vec<Variation>>;
}

/// Write operations over variation records.
pub trait VariationWriter {
    fn create_variations(
        &self,
        product_id: &str,
        new_variations: &[NewVariation],
    ) -> RepositoryResult<Vec<Variation>>;
    fn update_variation(
        &self,
        variation_id: i32,
        updates: &UpdateVariation,
    ) -> RepositoryResult<Variation>;
    fn update_variation_stock(&self, variation_id: i32, stock: i32)
    -> RepositoryResult<Variation>;
    fn update_variation_active(
        &self,
        variation_id: i32,
        active: bool,
    ) -> RepositoryResult<Variation>;
    fn delete_variations(&self, variation_ids: &[i32]) -> RepositoryResult<usize>;
    fn delete_variations_for_product(&self, product_id: &str) -> RepositoryResult<usize>;
}
