//! Compensating multi-step writes over products and variations.
//!
//! Every forward step that succeeds records how to undo itself. When a later
//! step fails the recorded compensations run newest first, so the store ends
//! up as it was before the saga started. Compensation failures are logged and
//! counted but do not stop the remaining compensations.

use std::fmt;

use thiserror::Error;

use crate::domain::product::{NewProduct, Product, UpdateProduct};
use crate::domain::variation::{NewVariation, UpdateVariation, Variation};
use crate::repository::errors::RepositoryError;
use crate::repository::{ProductWriter, VariationWriter};

/// Forward step of a product saga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaStep {
    InsertProduct,
    InsertVariations,
    UpdateProduct,
    UpdateVariation(i32),
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SagaStep::InsertProduct => f.write_str("insert product"),
            SagaStep::InsertVariations => f.write_str("insert variations"),
            SagaStep::UpdateProduct => f.write_str("update product"),
            SagaStep::UpdateVariation(id) => write!(f, "update variation {id}"),
        }
    }
}

/// A failed saga step, after compensation has run.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct SagaError {
    pub step: SagaStep,
    #[source]
    pub source: RepositoryError,
    /// Number of compensations that could not be applied.
    pub compensation_failures: usize,
}

impl SagaError {
    /// Whether every completed step was undone.
    pub fn fully_compensated(&self) -> bool {
        self.compensation_failures == 0
    }
}

#[derive(Debug)]
enum Compensation {
    /// Delete the product together with any variations pointing at it.
    RemoveProduct(String),
    RemoveVariations(Vec<i32>),
    RestoreProduct {
        id: String,
        previous: UpdateProduct,
    },
    RestoreVariation {
        id: i32,
        previous: UpdateVariation,
    },
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compensation::RemoveProduct(id) => write!(f, "remove product {id}"),
            Compensation::RemoveVariations(ids) => write!(f, "remove variations {ids:?}"),
            Compensation::RestoreProduct { id, .. } => write!(f, "restore product {id}"),
            Compensation::RestoreVariation { id, .. } => write!(f, "restore variation {id}"),
        }
    }
}

/// Ordered log of completed steps and their compensations.
pub struct ProductSaga<'a, R: ?Sized> {
    repo: &'a R,
    compensations: Vec<Compensation>,
}

impl<'a, R> ProductSaga<'a, R>
where
    R: ProductWriter + VariationWriter + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            compensations: Vec::new(),
        }
    }

    pub fn insert_product(&mut self, new_product: &NewProduct) -> Result<Product, SagaError> {
        match self.repo.create_product(new_product) {
            Ok(product) => {
                self.compensations
                    .push(Compensation::RemoveProduct(product.id.clone()));
                Ok(product)
            }
            Err(err) => Err(self.abort(SagaStep::InsertProduct, err)),
        }
    }

    pub fn insert_variations(
        &mut self,
        product_id: &str,
        new_variations: &[NewVariation],
    ) -> Result<Vec<Variation>, SagaError> {
        match self.repo.create_variations(product_id, new_variations) {
            Ok(created) => {
                self.compensations.push(Compensation::RemoveVariations(
                    created.iter().map(|variation| variation.id).collect(),
                ));
                Ok(created)
            }
            Err(err) => Err(self.abort(SagaStep::InsertVariations, err)),
        }
    }

    /// Overwrite `current` with `updates`, remembering `current` for rollback.
    pub fn update_product(
        &mut self,
        current: &Product,
        updates: &UpdateProduct,
    ) -> Result<Product, SagaError> {
        match self.repo.update_product(&current.id, updates) {
            Ok(product) => {
                self.compensations.push(Compensation::RestoreProduct {
                    id: current.id.clone(),
                    previous: UpdateProduct::from(current),
                });
                Ok(product)
            }
            Err(err) => Err(self.abort(SagaStep::UpdateProduct, err)),
        }
    }

    pub fn update_variation(
        &mut self,
        current: &Variation,
        updates: &UpdateVariation,
    ) -> Result<Variation, SagaError> {
        match self.repo.update_variation(current.id, updates) {
            Ok(variation) => {
                self.compensations.push(Compensation::RestoreVariation {
                    id: current.id,
                    previous: UpdateVariation::from(current),
                });
                Ok(variation)
            }
            Err(err) => Err(self.abort(SagaStep::UpdateVariation(current.id), err)),
        }
    }

    /// Finish the saga, keeping every write. Returns the number of steps.
    pub fn complete(self) -> usize {
        self.compensations.len()
    }

    fn abort(&mut self, step: SagaStep, source: RepositoryError) -> SagaError {
        log::error!("Saga step `{step}` failed: {source}");

        let mut compensation_failures = 0;
        while let Some(compensation) = self.compensations.pop() {
            if let Err(err) = self.compensate(&compensation) {
                compensation_failures += 1;
                log::error!("Compensation `{compensation}` failed: {err}");
            }
        }

        if compensation_failures == 0 {
            log::info!("Saga rolled back after `{step}` failed");
        }

        SagaError {
            step,
            source,
            compensation_failures,
        }
    }

    fn compensate(&self, compensation: &Compensation) -> Result<(), RepositoryError> {
        match compensation {
            Compensation::RemoveProduct(id) => {
                // Variations reference the product, so they go first.
                self.repo.delete_variations_for_product(id)?;
                self.repo.delete_product(id)
            }
            Compensation::RemoveVariations(ids) => {
                self.repo.delete_variations(ids).map(|_| ())
            }
            Compensation::RestoreProduct { id, previous } => {
                self.repo.update_product(id, previous).map(|_| ())
            }
            Compensation::RestoreVariation { id, previous } => {
                self.repo.update_variation(*id, previous).map(|_| ())
            }
        }
    }
}
