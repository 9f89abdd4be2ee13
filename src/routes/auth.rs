use actix_identity::Identity;
use actix_session::Session;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::config::ServerConfig;
use crate::forms::auth::LoginForm;
use crate::routes::{base_context, cart_count, redirect, render_template};
use crate::services::{ServiceError, auth};

#[get("/login")]
pub async fn show_login(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let context = base_context(&flash_messages, "login", cart_count(&session));
    render_template(&tera, "auth/login.html", &context)
}

#[post("/login")]
pub async fn login(
    request: HttpRequest,
    form: web::Form<LoginForm>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    match auth::login(&server_config.admin, &form) {
        Ok(user) => {
            let payload = match serde_json::to_string(&user) {
                Ok(payload) => payload,
                Err(err) => {
                    log::error!("Failed to serialize identity: {err}");
                    return HttpResponse::InternalServerError().finish();
                }
            };
            if let Err(err) = Identity::login(&request.extensions(), payload) {
                log::error!("Failed to start admin session: {err}");
                return HttpResponse::InternalServerError().finish();
            }
            FlashMessage::success("Signed in").send();
            redirect("/admin")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/login")
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Invalid username or password").send();
            redirect("/login")
        }
        Err(err) => {
            log::error!("Login failed: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/logout")]
pub async fn logout(identity: Option<Identity>) -> impl Responder {
    if let Some(identity) = identity {
        identity.logout();
    }
    FlashMessage::info("Signed out").send();
    redirect("/")
}
