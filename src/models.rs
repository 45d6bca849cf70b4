//! User entity and the JSON shapes exchanged by the user endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role every user holds, whether or not it was assigned.
pub const ROLE_USER: &str = "ROLE_USER";
/// Role required by the user administration endpoints.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Roles as assigned; see [`User::roles`] for the effective set.
    pub assigned_roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Effective roles: assigned roles deduplicated, with [`ROLE_USER`] always present.
    pub fn roles(&self) -> Vec<String> {
        normalize_roles(&self.assigned_roles)
    }

    pub fn has_role(&self, role: &str) -> bool {
        role == ROLE_USER || self.assigned_roles.iter().any(|r| r == role)
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            roles: self.roles(),
            created_at: Some(self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// View returned by register/update, without the creation timestamp.
    pub fn summary(&self) -> UserView {
        UserView {
            created_at: None,
            ..self.view()
        }
    }
}

/// Deduplicates roles keeping first occurrence order and appends [`ROLE_USER`] if missing.
pub fn normalize_roles(roles: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(roles.len() + 1);
    for role in roles {
        if !out.contains(role) {
            out.push(role.clone());
        }
    }
    if !out.iter().any(|r| r == ROLE_USER) {
        out.push(ROLE_USER.to_string());
    }
    out
}

/// Data needed to create a user; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

/// Public JSON view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Option<Vec<String>>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
