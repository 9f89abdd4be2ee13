//! Helpers for integration tests.
#![allow(dead_code)]

use chrono::NaiveDateTime;

use bangle_store::db::{DbPool, establish_connection_pool, run_migrations};
use bangle_store::domain::category::Category;
use bangle_store::domain::product::NewProduct;
use bangle_store::domain::variation::NewVariation;

/// File-backed SQLite database migrated from `migrations/`, deleted on drop.
pub struct TestDb {
    filename: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        std::fs::remove_file(filename).ok(); // Clean up old DB

        let pool =
            establish_connection_pool(filename).expect("Failed to establish SQLite connection.");
        run_migrations(&pool).expect("Migrations failed");
        TestDb {
            filename: filename.to_string(),
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.filename).ok();
        std::fs::remove_file(format!("{}-shm", &self.filename)).ok();
        std::fs::remove_file(format!("{}-wal", &self.filename)).ok();
    }
}

/// Product payload with a fixed id so tests can look it up.
pub fn new_product(id: &str, name: &str, category: Category, featured: bool) -> NewProduct {
    NewProduct {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} bangles"),
        images: vec![format!("/uploads/products/{id}.jpg")],
        category,
        featured,
        created_at: NaiveDateTime::default(),
    }
}

pub fn variation(color: &str, size: &str, price_cents: i64, stock: i32) -> NewVariation {
    NewVariation::new(color.to_string(), size.to_string(), price_cents, stock)
}
