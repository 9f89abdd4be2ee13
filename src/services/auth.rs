use validator::Validate;

use crate::ADMIN_ROLE;
use crate::config::AdminCredentials;
use crate::domain::auth::AuthenticatedUser;
use crate::forms::auth::LoginForm;
use crate::services::{ServiceError, ServiceResult};

/// Check the login form against the configured admin account.
pub fn login(credentials: &AdminCredentials, form: &LoginForm) -> ServiceResult<AuthenticatedUser> {
    if form.validate().is_err() {
        return Err(ServiceError::Form(
            "Please enter username and password".to_string(),
        ));
    }

    let username_matches = constant_time_eq(form.username.trim(), &credentials.username);
    let password_matches = constant_time_eq(&form.password, &credentials.password);
    if !(username_matches && password_matches) {
        log::warn!("Rejected admin login for `{}`", form.username.trim());
        return Err(ServiceError::Unauthorized);
    }

    log::info!("Admin `{}` signed in", credentials.username);
    Ok(AuthenticatedUser::new(
        credentials.username.clone(),
        &[ADMIN_ROLE],
    ))
}

fn constant_time_eq(left: &str, right: &str) -> bool {
    let (left, right) = (left.as_bytes(), right.as_bytes());
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
