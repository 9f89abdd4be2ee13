use chrono::Utc;
use diesel::prelude::*;

use crate::{
    domain::variation::{
        NewVariation as DomainNewVariation, UpdateVariation as DomainUpdateVariation,
        Variation as DomainVariation,
    },
    models::variation::{
        NewVariation as DbNewVariation, UpdateVariation as DbUpdateVariation,
        Variation as DbVariation,
    },
    repository::errors::{RepositoryError, RepositoryResult},
    repository::{DieselRepository, VariationReader, VariationWriter},
};

impl VariationReader for DieselRepository {
    fn get_variation_by_id(&self, id: i32) -> RepositoryResult<Option<DomainVariation>> {
        use crate::schema::variations;

        let mut conn = self.conn()?;
        let variation = variations::table
            .find(id)
            .select(DbVariation::as_select())
            .first::<DbVariation>(&mut conn)
            .optional()?;

        Ok(variation.map(Into::into))
    }

    fn list_variations(&self, product_id: &str) -> RepositoryResult<Vec<DomainVariation>> {
        use crate::schema::variations;

        let mut conn = self.conn()?;
        let rows = variations::table
            .filter(variations::product_id.eq(product_id))
            .order(variations::id.asc())
            .select(DbVariation::as_select())
            .load::<DbVariation>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl VariationWriter for DieselRepository {
    fn create_variations(
        &self,
        product_id: &str,
        new_variations: &[DomainNewVariation],
    ) -> RepositoryResult<Vec<DomainVariation>> {
        use crate::schema::variations;

        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();

        // One batch either lands completely or not at all.
        conn.transaction::<Vec<DomainVariation>, RepositoryError, _>(|conn| {
            let mut created = Vec::with_capacity(new_variations.len());

            for new in new_variations {
                let db_new = DbNewVariation::for_product(product_id, new, now);

                let row = diesel::insert_into(variations::table)
                    .values(&db_new)
                    .returning(DbVariation::as_returning())
                    .get_result::<DbVariation>(conn)?;
                created.push(row.into());
            }

            Ok(created)
        })
    }

    fn update_variation(
        &self,
        variation_id: i32,
        updates: &DomainUpdateVariation,
    ) -> RepositoryResult<DomainVariation> {
        use crate::schema::variations;

        let mut conn = self.conn()?;
        let db_updates = DbUpdateVariation::from(updates);

        let updated = diesel::update(variations::table.find(variation_id))
            .set(&db_updates)
            .returning(DbVariation::as_returning())
            .get_result::<DbVariation>(&mut conn)?;

        Ok(updated.into())
    }

    fn update_variation_stock(
        &self,
        variation_id: i32,
        stock: i32,
    ) -> RepositoryResult<DomainVariation> {
        use crate::schema::variations;

        let mut conn = self.conn()?;

        let updated = diesel::update(variations::table.find(variation_id))
            .set((
                variations::stock.eq(stock),
                variations::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbVariation::as_returning())
            .get_result::<DbVariation>(&mut conn)?;

        Ok(updated.into())
    }

    fn update_variation_active(
        &self,
        variation_id: i32,
        active: bool,
    ) -> RepositoryResult<DomainVariation> {
        use crate::schema::variations;

        let mut conn = self.conn()?;

        let updated = diesel::update(variations::table.find(variation_id))
            .set((
                variations::active.eq(active),
                variations::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbVariation::as_returning())
            .get_result::<DbVariation>(&mut conn)?;

        Ok(updated.into())
    }

    fn delete_variations(&self, variation_ids: &[i32]) -> RepositoryResult<usize> {
        use crate::schema::variations;

        if variation_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let deleted = diesel::delete(variations::table.filter(variations::id.eq_any(variation_ids)))
            .execute(&mut conn)?;

        Ok(deleted)
    }

    fn delete_variations_for_product(&self, product_id: &str) -> RepositoryResult<usize> {
        use crate::schema::variations;

        let mut conn = self.conn()?;
        let deleted =
            diesel::delete(variations::table.filter(variations::product_id.eq(product_id)))
                .execute(&mut conn)?;

        Ok(deleted)
    }
}
