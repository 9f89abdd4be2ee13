use mockall::mock;

use super::{ProductReader, ProductWriter, VariationReader, VariationWriter};
use crate::domain::product::{NewProduct, Product, ProductListQuery, UpdateProduct};
use crate::domain::variation::{NewVariation, UpdateVariation, Variation};
use crate::repository::errors::RepositoryResult;

mock! {
    pub ProductReader {}

    impl ProductReader for ProductReader {
        fn get_product_by_id(&self, id: &str) -> RepositoryResult<Option<Product>>;
        fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<Product>>;
    }
}

mock! {
    pub ProductWriter {}

    impl ProductWriter for ProductWriter {
        fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
        fn update_product(&self, product_id: &str, updates: &UpdateProduct) -> RepositoryResult<Product>;
        fn delete_product(&self, product_id: &str) -> RepositoryResult<()>;
    }
}

mock! {
    pub VariationReader {}

    impl VariationReader for VariationReader {
        fn get_variation_by_id(&self, id: i32) -> RepositoryResult<Option<Variation>>;
        fn list_variations(&self, product_id: &str) -> RepositoryResult<Vec<Variation>>;
    }
}

mock! {
    pub VariationWriter {}

    impl VariationWriter for VariationWriter {
        fn create_variations(&self, product_id: &str, new_variations: &[NewVariation]) -> RepositoryResult<Vec<Variation>>;
        fn update_variation(&self, variation_id: i32, updates: &UpdateVariation) -> RepositoryResult<Variation>;
        fn update_variation_stock(&self, variation_id: i32, stock: i32) -> RepositoryResult<Variation>;
        fn update_variation_active(&self, variation_id: i32, active: bool) -> RepositoryResult<Variation>;
        fn delete_variations(&self, variation_ids: &[i32]) -> RepositoryResult<usize>;
        fn delete_variations_for_product(&self, product_id: &str) -> RepositoryResult<usize>;
    }
}

/// Repository double combining every mock so services bounded by several
/// traits can be exercised.
pub struct FakeRepo {
    pub product_reader: MockProductReader,
    pub product_writer: MockProductWriter,
    pub variation_reader: MockVariationReader,
    pub variation_writer: MockVariationWriter,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self {
            product_reader: MockProductReader::new(),
            product_writer: MockProductWriter::new(),
            variation_reader: MockVariationReader::new(),
            variation_writer: MockVariationWriter::new(),
        }
    }
}

impl ProductReader for FakeRepo {
    fn get_product_by_id(&self, id: &str) -> RepositoryResult<Option<Product>> {
        self.product_reader.get_product_by_id(id)
    }

    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<Vec<Product>> {
        self.product_reader.list_products(query)
    }
}

impl ProductWriter for FakeRepo {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product> {
        self.product_writer.create_product(new_product)
    }

    fn update_product(
        &self,
        product_id: &str,
        updates: &UpdateProduct,
    ) -> RepositoryResult<Product> {
        self.product_writer.update_product(product_id, updates)
    }

    fn delete_product(&self, product_id: &str) -> RepositoryResult<()> {
        self.product_writer.delete_product(product_id)
    }
}

impl VariationReader for FakeRepo {
    fn get_variation_by_id(&self, id: i32) -> RepositoryResult<Option<Variation>> {
        self.variation_reader.get_variation_by_id(id)
    }

    fn list_variations(&self, product_id: &str) -> RepositoryResult<Vec<Variation>> {
        self.variation_reader.list_variations(product_id)
    }
}

impl VariationWriter for FakeRepo {
    fn create_variations(
        &self,
        product_id: &str,
        new_variations: &[NewVariation],
    ) -> RepositoryResult<Vec<Variation>> {
        self.variation_writer
            .create_variations(product_id, new_variations)
    }

    fn update_variation(
        &self,
        variation_id: i32,
        updates: &UpdateVariation,
    ) -> RepositoryResult<Variation> {
        self.variation_writer.update_variation(variation_id, updates)
    }

    fn update_variation_stock(&self, variation_id: i32, stock: i32) -> RepositoryResult<Variation> {
        self.variation_writer
            .update_variation_stock(variation_id, stock)
    }

    fn update_variation_active(
        &self,
        variation_id: i32,
        active: bool,
    ) -> RepositoryResult<Variation> {
        self.variation_writer
            .update_variation_active(variation_id, active)
    }

    fn delete_variations(&self, variation_ids: &[i32]) -> RepositoryResult<usize> {
        self.variation_writer.delete_variations(variation_ids)
    }

    fn delete_variations_for_product(&self, product_id: &str) -> RepositoryResult<usize> {
        self.variation_writer.delete_variations_for_product(product_id)
    }
}
