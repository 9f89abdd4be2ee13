use serde::{Deserialize, Serialize};

/// Identity stored in the session cookie after a successful admin login.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn new(username: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            username: username.into(),
            roles: roles.iter().map(|role| (*role).to_string()).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        check_role(role, &self.roles)
    }
}

/// Whether `role` is present in `roles`.
pub fn check_role(role: &str, roles: &[String]) -> bool {
    roles.iter().any(|candidate| candidate == role)
}
