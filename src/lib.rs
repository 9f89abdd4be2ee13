pub mod config;
pub mod db;
pub mod domain;
pub mod forms;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;
pub mod storage;

/// Role granted to the configured admin account.
pub const ADMIN_ROLE: &str = "admin";
