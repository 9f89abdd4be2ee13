use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading the server configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Credentials accepted by the admin login form.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Runtime configuration shared with every handler.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// Cookie signing secret. `None` means a key is generated at startup.
    pub secret: Option<String>,
    pub cookie_secure: bool,
    /// Directory where uploaded product images are written.
    pub upload_dir: PathBuf,
    /// URL prefix the upload directory is served under.
    pub upload_public_path: String,
    /// Digits of the phone number orders are handed off to.
    pub whatsapp_number: String,
    pub admin: AdminCredentials,
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_raw = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port_raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: port_raw.clone(),
        })?;

        let whatsapp_raw = required("WHATSAPP_NUMBER")?;
        let whatsapp_number = normalize_phone_digits(&whatsapp_raw);
        if whatsapp_number.is_empty() {
            return Err(ConfigError::Invalid {
                name: "WHATSAPP_NUMBER",
                value: whatsapp_raw,
            });
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "app.db".to_string()),
            address: env::var("ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            secret: env::var("SECRET_KEY").ok().filter(|value| !value.is_empty()),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./uploads")),
            upload_public_path: env::var("UPLOAD_PUBLIC_PATH")
                .unwrap_or_else(|_| "/uploads".to_string()),
            whatsapp_number,
            admin: AdminCredentials {
                username: required("ADMIN_USERNAME")?,
                password: required("ADMIN_PASSWORD")?,
            },
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Strip everything but ASCII digits, as expected by `wa.me` links.
pub fn normalize_phone_digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}
