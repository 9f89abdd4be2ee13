pub mod auth;
pub mod cart;
pub mod category;
pub mod order;
pub mod price;
pub mod product;
pub mod variation;
