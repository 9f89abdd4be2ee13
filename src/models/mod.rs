pub mod product;
pub mod variation;
