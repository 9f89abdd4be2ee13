use actix_files::Files;
use actix_identity::IdentityMiddleware;
use actix_multipart::form::MultipartFormConfig;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use tera::Tera;

use bangle_store::config::ServerConfig;
use bangle_store::db::{establish_connection_pool, run_migrations};
use bangle_store::repository::DieselRepository;
use bangle_store::routes::admin::{
    add_variation, create_product, delete_product, edit_product, new_product,
    show_admin_products, toggle_active, update_product, update_stock,
};
use bangle_store::routes::api::api_v1_products;
use bangle_store::routes::auth::{login, logout, show_login};
use bangle_store::routes::cart::{add_to_cart, clear_cart, remove_from_cart, show_cart, update_cart};
use bangle_store::routes::catalog::{show_catalog, show_product};
use bangle_store::routes::checkout::{place_order, show_checkout};
use bangle_store::routes::main::{health, not_found, show_index};
use bangle_store::routes::register_filters;
use bangle_store::storage::LocalImageStorage;

/// Upper bound for one multipart submission of the product editor.
const MULTIPART_TOTAL_LIMIT: usize = 50 * 1024 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; img-src 'self' data:; \
     style-src 'self'; script-src 'self'; \
     form-action 'self' https://wa.me https://api.whatsapp.com; frame-ancestors 'self'";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let secret_key = match &server_config.secret {
        Some(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        Some(_) => {
            log::error!("SECRET_KEY must be at least 64 bytes long");
            std::process::exit(1);
        }
        None => {
            log::warn!("SECRET_KEY not set, sessions will not survive a restart");
            Key::generate()
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = run_migrations(&pool) {
        log::error!("Failed to run migrations: {e}");
        std::process::exit(1);
    }
    let repo = DieselRepository::new(pool);

    if let Err(e) = std::fs::create_dir_all(&server_config.upload_dir) {
        log::error!(
            "Failed to create upload directory {}: {e}",
            server_config.upload_dir.display()
        );
        std::process::exit(1);
    }
    let storage = LocalImageStorage::new(
        server_config.upload_dir.clone(),
        server_config.upload_public_path.clone(),
    );

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = match Tera::new("templates/**/*") {
        Ok(mut t) => {
            register_filters(&mut t);
            t
        }
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    let address = server_config.address.clone();
    let port = server_config.port;
    log::info!("Listening on {address}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(server_config.cookie_secure)
                    .build(),
            )
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "SAMEORIGIN"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Content-Security-Policy", CONTENT_SECURITY_POLICY)),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(Files::new(
                &server_config.upload_public_path,
                server_config.upload_dir.clone(),
            ))
            .service(health)
            .service(show_index)
            .service(show_catalog)
            .service(show_product)
            .service(show_cart)
            .service(add_to_cart)
            .service(update_cart)
            .service(remove_from_cart)
            .service(clear_cart)
            .service(show_checkout)
            .service(place_order)
            .service(show_login)
            .service(login)
            .service(logout)
            .service(show_admin_products)
            .service(new_product)
            .service(edit_product)
            .service(create_product)
            .service(update_product)
            .service(delete_product)
            .service(add_variation)
            .service(update_stock)
            .service(toggle_active)
            .service(web::scope("/api").service(api_v1_products))
            .default_service(web::to(not_found))
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(MULTIPART_TOTAL_LIMIT)
                    .memory_limit(MULTIPART_TOTAL_LIMIT),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(server_config.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}
