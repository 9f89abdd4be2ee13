//! Product data access: typed reads plus the multi-step writes, each run as a
//! compensating saga.

use crate::domain::category::CategoryFilter;
use crate::domain::product::{NewProduct, Product, ProductChanges, ProductListQuery};
use crate::domain::variation::{NewVariation, UpdateVariation, Variation};
use crate::repository::errors::RepositoryError;
use crate::repository::{ProductReader, ProductWriter, VariationWriter};
use crate::services::saga::{ProductSaga, SagaError};
use crate::services::{ServiceError, ServiceResult};

/// Number of related products shown on a product page.
pub const RELATED_PRODUCTS_LIMIT: usize = 3;

/// Result of [`update_product`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub product: Product,
    /// Rows that were not written because they carry no id of this product.
    pub skipped_variations: usize,
}

pub fn fetch_all<R>(repo: &R) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    repo.list_products(ProductListQuery::new())
        .map_err(ServiceError::from)
}

/// A missing product is `Ok(None)`, not an error.
pub fn fetch_by_id<R>(repo: &R, product_id: &str) -> ServiceResult<Option<Product>>
where
    R: ProductReader + ?Sized,
{
    repo.get_product_by_id(product_id)
        .map_err(ServiceError::from)
}

pub fn fetch_featured<R>(repo: &R) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    repo.list_products(ProductListQuery::new().featured())
        .map_err(ServiceError::from)
}

pub fn fetch_by_category<R>(repo: &R, category: CategoryFilter) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    repo.list_products(ProductListQuery::new().category(category))
        .map_err(ServiceError::from)
}

/// Products of the same category as `product`, excluding it.
pub fn fetch_related<R>(repo: &R, product: &Product, limit: usize) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    if limit == 0 {
        return Ok(Vec::new());
    }

    let query = ProductListQuery::new()
        .category(CategoryFilter::Only(product.category))
        .exclude(product.id.clone())
        .limit(limit);

    repo.list_products(query).map_err(ServiceError::from)
}

/// Insert the product row, then its variations. A failed variation insert
/// deletes the product row again.
pub fn create_product<R>(
    repo: &R,
    new_product: &NewProduct,
    new_variations: &[NewVariation],
) -> ServiceResult<Product>
where
    R: ProductWriter + VariationWriter + ?Sized,
{
    if new_variations.is_empty() {
        return Err(ServiceError::Form(
            "At least one variation is required".to_string(),
        ));
    }
    if new_product.images.is_empty() {
        return Err(ServiceError::Form(
            "At least one image is required".to_string(),
        ));
    }

    let mut saga = ProductSaga::new(repo);
    let mut product = saga.insert_product(new_product)?;
    product.variations = saga.insert_variations(&product.id, new_variations)?;
    saga.complete();

    log::info!(
        "Created product {} with {} variations",
        product.id,
        product.variations.len()
    );
    Ok(product)
}

/// Update the product row and every variation row that carries an id of this
/// product. Rows without such an id are skipped. Any failure restores the rows
/// already written.
///
/// Rows that trade options with each other (say 2.2 and 2.4 swapped) are first
/// moved to a placeholder size, so the UNIQUE index never sees two rows with
/// the same color and size in between.
pub fn update_product<R>(
    repo: &R,
    product_id: &str,
    changes: &ProductChanges,
) -> ServiceResult<UpdateOutcome>
where
    R: ProductReader + ProductWriter + VariationWriter + ?Sized,
{
    let current = repo
        .get_product_by_id(product_id)?
        .ok_or(ServiceError::NotFound)?;

    let mut skipped_variations = 0;
    let mut plan: Vec<(Variation, &UpdateVariation)> = Vec::new();
    for change in &changes.variations {
        match change.id.and_then(|id| current.find_variation(id)) {
            Some(existing) => plan.push((existing.clone(), &change.update)),
            None => {
                skipped_variations += 1;
                log::warn!(
                    "Skipping variation row {:?} ({} / {}) of product {product_id}: no stored id",
                    change.id,
                    change.update.color,
                    change.update.size
                );
            }
        }
    }

    let mut saga = ProductSaga::new(repo);
    let mut updated = saga.update_product(&current, &changes.product)?;

    let parked: Vec<usize> = (0..plan.len())
        .filter(|&index| must_park(&plan, index))
        .collect();
    for index in parked {
        let (state, update) = &plan[index];
        let mut placeholder = UpdateVariation::from(state);
        placeholder.size = format!("{}~{}", state.size, state.id);
        let moved = saga.update_variation(state, &placeholder)?;
        log::debug!(
            "Parked variation {} of product {product_id} before moving it to {} / {}",
            moved.id,
            update.color,
            update.size
        );
        plan[index].0 = moved;
    }

    let mut written: Vec<Variation> = Vec::new();
    for (state, update) in &plan {
        let variation = saga
            .update_variation(state, update)
            .map_err(|err| variation_conflict(err, update))?;
        written.push(variation);
    }
    saga.complete();

    updated.variations = current
        .variations
        .iter()
        .map(|variation| {
            written
                .iter()
                .find(|candidate| candidate.id == variation.id)
                .cloned()
                .unwrap_or_else(|| variation.clone())
        })
        .collect();

    Ok(UpdateOutcome {
        product: updated,
        skipped_variations,
    })
}

/// A row moves away from its options while another row of the same update
/// moves onto them.
fn must_park(plan: &[(Variation, &UpdateVariation)], index: usize) -> bool {
    let (state, update) = &plan[index];
    if state.same_options(&update.color, &update.size) {
        return false;
    }
    plan.iter().enumerate().any(|(other, (_, other_update))| {
        other != index && state.same_options(&other_update.color, &other_update.size)
    })
}

/// A UNIQUE failure that was fully rolled back means the options clash with a
/// row the shopper did not move. Anything else stays a saga error.
fn variation_conflict(err: SagaError, update: &UpdateVariation) -> ServiceError {
    let duplicate = matches!(
        &err.source,
        RepositoryError::ConstraintViolation(message) if message.contains("UNIQUE")
    );
    if duplicate && err.fully_compensated() {
        log::warn!("Variation update rolled back: {err}");
        ServiceError::Conflict(format!(
            "Another variation of this product already uses {} / {}. No changes were saved",
            update.color, update.size
        ))
    } else {
        ServiceError::from(err)
    }
}

/// Delete the variations, then the product. When the variations cannot be
/// deleted the product row is left untouched.
pub fn delete_product<R>(repo: &R, product_id: &str) -> ServiceResult<()>
where
    R: ProductWriter + VariationWriter + ?Sized,
{
    let removed = repo
        .delete_variations_for_product(product_id)
        .map_err(|err| {
            log::error!("Failed to delete variations of product {product_id}: {err}");
            ServiceError::from(err)
        })?;

    repo.delete_product(product_id)?;
    log::info!("Deleted product {product_id} and {removed} variations");
    Ok(())
}

pub fn update_variation_stock<R>(repo: &R, variation_id: i32, stock: i32) -> ServiceResult<Variation>
where
    R: VariationWriter + ?Sized,
{
    if stock < 0 {
        return Err(ServiceError::Form("Stock cannot be negative".to_string()));
    }

    repo.update_variation_stock(variation_id, stock)
        .map_err(ServiceError::from)
}

pub fn update_variation_active<R>(
    repo: &R,
    variation_id: i32,
    active: bool,
) -> ServiceResult<Variation>
where
    R: VariationWriter + ?Sized,
{
    repo.update_variation_active(variation_id, active)
        .map_err(ServiceError::from)
}

/// Attach a new variation to an existing product. A second row with the same
/// color and size is refused.
pub fn add_variation<R>(
    repo: &R,
    product_id: &str,
    new_variation: &NewVariation,
) -> ServiceResult<Variation>
where
    R: ProductReader + VariationWriter + ?Sized,
{
    let product = repo
        .get_product_by_id(product_id)?
        .ok_or(ServiceError::NotFound)?;

    let conflict = || {
        ServiceError::Conflict(format!(
            "A {} / {} variation already exists",
            new_variation.color, new_variation.size
        ))
    };

    if product
        .find_variation_by_options(&new_variation.color, &new_variation.size)
        .is_some()
    {
        return Err(conflict());
    }

    let created = repo
        .create_variations(&product.id, std::slice::from_ref(new_variation))
        .map_err(|err| match err {
            RepositoryError::ConstraintViolation(_) => conflict(),
            other => ServiceError::from(other),
        })?;

    created
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Internal("variation insert returned no row".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;
    use crate::domain::product::{UpdateProduct, VariationChange};
    use crate::repository::mock::FakeRepo;
    use crate::services::saga::SagaStep;
    use chrono::NaiveDateTime;

    fn variation(id: i32, color: &str, size: &str) -> Variation {
        Variation {
            id,
            product_id: "oreo-swirl-1".to_string(),
            color: color.to_string(),
            size: size.to_string(),
            price_cents: 18000,
            stock: 10,
            active: true,
        }
    }

    fn product(id: &str, variations: Vec<Variation>) -> Product {
        Product {
            id: id.to_string(),
            name: "Oreo Swirl".to_string(),
            description: "Black and white".to_string(),
            images: vec!["/uploads/products/1.jpg".to_string()],
            category: Category::Oreo,
            featured: false,
            variations,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn new_product(images: Vec<String>) -> NewProduct {
        NewProduct {
            id: "oreo-swirl-1".to_string(),
            name: "Oreo Swirl".to_string(),
            description: "Black and white".to_string(),
            images,
            category: Category::Oreo,
            featured: false,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn fetch_related_filters_by_category_and_excludes_self() {
        let mut repo = FakeRepo::new();
        let current = product("oreo-swirl-1", vec![]);

        repo.product_reader
            .expect_list_products()
            .times(1)
            .withf(|query| {
                assert_eq!(query.category, CategoryFilter::Only(Category::Oreo));
                assert_eq!(query.exclude_id.as_deref(), Some("oreo-swirl-1"));
                assert_eq!(query.limit, Some(RELATED_PRODUCTS_LIMIT));
                true
            })
            .returning(|_| Ok(vec![product("oreo-dots-2", vec![])]));

        let related =
            fetch_related(&repo, &current, RELATED_PRODUCTS_LIMIT).expect("expected success");

        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, "oreo-dots-2");
    }

    #[test]
    fn create_product_requires_variations_and_images() {
        let repo = FakeRepo::new();

        let no_variations = create_product(&repo, &new_product(vec!["a".into()]), &[]);
        assert!(matches!(no_variations, Err(ServiceError::Form(ref msg)) if msg == "At least one variation is required"));

        let no_images = create_product(
            &repo,
            &new_product(vec![]),
            &[NewVariation::new("Red", "2.2", 18000, 10)],
        );
        assert!(matches!(no_images, Err(ServiceError::Form(ref msg)) if msg == "At least one image is required"));
    }

    #[test]
    fn create_product_attaches_created_variations() {
        let mut repo = FakeRepo::new();

        repo.product_writer
            .expect_create_product()
            .times(1)
            .returning(|new| Ok(product(&new.id, vec![])));
        repo.variation_writer
            .expect_create_variations()
            .times(1)
            .withf(|product_id, rows| product_id == "oreo-swirl-1" && rows.len() == 2)
            .returning(|_, _| Ok(vec![variation(1, "Red", "2.2"), variation(2, "Red", "2.4")]));

        let created = create_product(
            &repo,
            &new_product(vec!["/uploads/products/1.jpg".into()]),
            &[
                NewVariation::new("Red", "2.2", 18000, 10),
                NewVariation::new("Red", "2.4", 18000, 5),
            ],
        )
        .expect("expected success");

        assert_eq!(created.variations.len(), 2);
    }

    #[test]
    fn create_product_rolls_back_on_variation_failure() {
        let mut repo = FakeRepo::new();

        repo.product_writer
            .expect_create_product()
            .returning(|new| Ok(product(&new.id, vec![])));
        repo.variation_writer
            .expect_create_variations()
            .returning(|_, _| Err(RepositoryError::ConstraintViolation("UNIQUE".into())));
        repo.variation_writer
            .expect_delete_variations_for_product()
            .times(1)
            .returning(|_| Ok(0));
        repo.product_writer
            .expect_delete_product()
            .times(1)
            .returning(|_| Ok(()));

        let result = create_product(
            &repo,
            &new_product(vec!["/uploads/products/1.jpg".into()]),
            &[NewVariation::new("Red", "2.2", 18000, 10)],
        );

        match result {
            Err(ServiceError::Saga(err)) => {
                assert_eq!(err.step, SagaStep::InsertVariations);
                assert!(err.fully_compensated());
            }
            other => panic!("expected saga error, got {other:?}"),
        }
    }

    #[test]
    fn update_product_skips_rows_without_known_ids() {
        let mut repo = FakeRepo::new();
        let stored = product("oreo-swirl-1", vec![variation(1, "Red", "2.2")]);
        let lookup = stored.clone();

        repo.product_reader
            .expect_get_product_by_id()
            .times(1)
            .returning(move |_| Ok(Some(lookup.clone())));
        repo.product_writer
            .expect_update_product()
            .times(1)
            .returning(|id, _| Ok(product(id, vec![])));
        repo.variation_writer
            .expect_update_variation()
            .times(1)
            .withf(|id, updates| *id == 1 && updates.stock == 3)
            .returning(|_, _| {
                let mut updated = variation(1, "Red", "2.2");
                updated.stock = 3;
                Ok(updated)
            });

        let mut first = UpdateVariation::from(&stored.variations[0]);
        first.stock = 3;
        let fresh = UpdateVariation::from(&variation(0, "Blue", "2.6"));
        let foreign = UpdateVariation::from(&variation(0, "Gold", "2.8"));

        let changes = ProductChanges {
            product: UpdateProduct::from(&stored),
            variations: vec![
                VariationChange {
                    id: Some(1),
                    update: first,
                },
                VariationChange {
                    id: None,
                    update: fresh,
                },
                VariationChange {
                    id: Some(99),
                    update: foreign,
                },
            ],
        };

        let outcome = update_product(&repo, "oreo-swirl-1", &changes).expect("expected success");

        assert_eq!(outcome.skipped_variations, 2);
        assert_eq!(outcome.product.variations.len(), 1);
        assert_eq!(outcome.product.variations[0].stock, 3);
    }

    #[test]
    fn update_product_missing_is_not_found() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|_| Ok(None));

        let stored = product("gone", vec![]);
        let changes = ProductChanges {
            product: UpdateProduct::from(&stored),
            variations: vec![],
        };

        let result = update_product(&repo, "gone", &changes);
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn delete_product_leaves_product_when_variation_delete_fails() {
        let mut repo = FakeRepo::new();

        repo.variation_writer
            .expect_delete_variations_for_product()
            .times(1)
            .returning(|_| Err(RepositoryError::Serialization("boom".into())));
        repo.product_writer.expect_delete_product().never();

        let result = delete_product(&repo, "oreo-swirl-1");
        assert!(matches!(result, Err(ServiceError::Repository(_))));
    }

    #[test]
    fn delete_product_removes_variations_first() {
        let mut repo = FakeRepo::new();
        let mut seq = mockall::Sequence::new();

        repo.variation_writer
            .expect_delete_variations_for_product()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(2));
        repo.product_writer
            .expect_delete_product()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        delete_product(&repo, "oreo-swirl-1").expect("expected success");
    }

    #[test]
    fn update_variation_stock_rejects_negative_values() {
        let repo = FakeRepo::new();
        let result = update_variation_stock(&repo, 1, -1);
        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn add_variation_rejects_existing_options() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(product(id, vec![variation(1, "Red", "2.2")]))));
        repo.variation_writer.expect_create_variations().never();

        let result = add_variation(
            &repo,
            "oreo-swirl-1",
            &NewVariation::new("Red", "2.2", 100, 1),
        );

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn add_variation_creates_new_row() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(product(id, vec![variation(1, "Red", "2.2")]))));
        repo.variation_writer
            .expect_create_variations()
            .times(1)
            .returning(|_, _| Ok(vec![variation(2, "Red", "2.4")]));

        let created = add_variation(
            &repo,
            "oreo-swirl-1",
            &NewVariation::new("Red", "2.4", 100, 1),
        )
        .expect("expected success");

        assert_eq!(created.id, 2);
    }
}
