use std::collections::HashMap;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::category::CategoryFilter,
    domain::product::{
        NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery,
        UpdateProduct as DomainUpdateProduct,
    },
    domain::variation::Variation as DomainVariation,
    models::product::{
        NewProduct as DbNewProduct, Product as DbProduct, UpdateProduct as DbUpdateProduct,
    },
    models::variation::Variation as DbVariation,
    repository::errors::{RepositoryError, RepositoryResult},
    repository::{DieselRepository, ProductReader, ProductWriter},
};

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: &str) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::id.eq(id))
            .select(DbProduct::as_select())
            .first::<DbProduct>(&mut conn)
            .optional()?;

        let Some(db_product) = product else {
            return Ok(None);
        };

        let mut variations = load_variations_for_products(&mut conn, &[db_product.id.clone()])?;
        let own = variations.remove(&db_product.id).unwrap_or_default();
        db_product.into_domain(own).map(Some)
    }

    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let mut items = products::table
            .select(DbProduct::as_select())
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let CategoryFilter::Only(category) = query.category {
            items = items.filter(products::category.eq(category.slug()));
        }

        if query.featured_only {
            items = items.filter(products::featured.eq(true));
        }

        if let Some(term) = query.search.as_deref().map(str::trim)
            && !term.is_empty()
        {
            // SQLite LIKE is case-insensitive for ASCII.
            let pattern = format!("%{term}%");
            items = items.filter(
                products::name
                    .like(pattern.clone())
                    .or(products::description.like(pattern.clone()))
                    .or(products::category.like(pattern)),
            );
        }

        if let Some(exclude_id) = query.exclude_id.as_ref() {
            items = items.filter(products::id.ne(exclude_id));
        }

        items = items.order((products::created_at.asc(), products::id.asc()));

        if let Some(limit) = query.limit {
            items = items.limit(limit as i64);
        }

        let db_products = items.load::<DbProduct>(&mut conn)?;

        if db_products.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<String> = db_products.iter().map(|p| p.id.clone()).collect();
        let mut variation_map = load_variations_for_products(&mut conn, &product_ids)?;

        db_products
            .into_iter()
            .map(|db_product| {
                let variations = variation_map.remove(&db_product.id).unwrap_or_default();
                db_product.into_domain(variations)
            })
            .collect()
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_new = DbNewProduct::try_from_domain(new_product)?;

        let created = diesel::insert_into(products::table)
            .values(&db_new)
            .returning(DbProduct::as_returning())
            .get_result::<DbProduct>(&mut conn)?;

        created.into_domain(Vec::new())
    }

    fn update_product(
        &self,
        product_id: &str,
        updates: &DomainUpdateProduct,
    ) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_updates = DbUpdateProduct::try_from_domain(updates)?;

        let updated = diesel::update(products::table.filter(products::id.eq(product_id)))
            .set(&db_updates)
            .returning(DbProduct::as_returning())
            .get_result::<DbProduct>(&mut conn)?;

        let mut variations = load_variations_for_products(&mut conn, &[updated.id.clone()])?;
        let own = variations.remove(&updated.id).unwrap_or_default();
        updated.into_domain(own)
    }

    fn delete_product(&self, product_id: &str) -> RepositoryResult<()> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let deleted =
            diesel::delete(products::table.filter(products::id.eq(product_id))).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

fn load_variations_for_products(
    conn: &mut SqliteConnection,
    product_ids: &[String],
) -> RepositoryResult<HashMap<String, Vec<DomainVariation>>> {
    use crate::schema::variations;

    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = variations::table
        .filter(variations::product_id.eq_any(product_ids))
        .order(variations::id.asc())
        .select(DbVariation::as_select())
        .load::<DbVariation>(conn)?;

    let mut map: HashMap<String, Vec<DomainVariation>> = HashMap::new();
    for row in rows {
        map.entry(row.product_id.clone()).or_default().push(row.into());
    }

    Ok(map)
}
