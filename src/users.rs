//! Registration and user administration handlers.

use crate::auth::hash_password;
use crate::error::{ProxyError, ProxyResult};
use crate::models::{
    MessageResponse, NewUser, RegisterRequest, UpdateUserRequest, UserEnvelope, UserView,
    ROLE_USER,
};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

const MAX_EMAIL_LEN: usize = 180;
const MAX_NAME_LEN: usize = 100;

/// Required registration fields, in the order reported to callers.
const REQUIRED_FIELDS: [&str; 4] = ["email", "password", "firstName", "lastName"];

fn bad_request(message: impl Into<String>) -> ProxyError {
    ProxyError::http(StatusCode::BAD_REQUEST, message)
}

fn user_not_found() -> ProxyError {
    ProxyError::not_found("User not found")
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Checks field formats; returns every violation found.
fn validate(email: &str, first_name: &str, last_name: &str) -> ProxyResult<()> {
    let mut violations = Vec::new();

    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    });
    if !well_formed {
        violations.push(format!("email: \"{email}\" is not a valid email address"));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        violations.push(format!("email: must be at most {MAX_EMAIL_LEN} characters"));
    }
    if first_name.chars().count() > MAX_NAME_LEN {
        violations.push(format!("firstName: must be at most {MAX_NAME_LEN} characters"));
    }
    if last_name.chars().count() > MAX_NAME_LEN {
        violations.push(format!("lastName: must be at most {MAX_NAME_LEN} characters"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(bad_request(format!("Validation failed: {}", violations.join("; "))))
    }
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ProxyResult<(StatusCode, Json<UserEnvelope>)> {
    let (Some(email), Some(password), Some(first_name), Some(last_name)) = (
        present(req.email),
        present(req.password),
        present(req.first_name),
        present(req.last_name),
    ) else {
        return Err(bad_request(format!(
            "Missing required fields: {}",
            REQUIRED_FIELDS.join(", ")
        )));
    };

    if state.users.find_by_email(&email).await?.is_some() {
        tracing::debug!("Registration rejected, {} already exists", email);
        return Err(ProxyError::http(StatusCode::CONFLICT, "User already exists"));
    }

    validate(&email, &first_name, &last_name)?;

    let roles = req.roles.unwrap_or_else(|| vec![ROLE_USER.to_string()]);
    let user = state
        .users
        .insert(NewUser {
            email,
            password_hash: hash_password(&password)?,
            first_name,
            last_name,
            roles,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User created successfully".to_string(),
            user: user.summary(),
        }),
    ))
}

/// `GET /api/users`
pub async fn list_users(State(state): State<AppState>) -> ProxyResult<Json<Vec<UserView>>> {
    let users = state.users.list().await?;
    Ok(Json(users.iter().map(|u| u.view()).collect()))
}

/// `GET /api/users/{id}`
pub async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ProxyResult<Json<UserView>> {
    let user = state.users.find_by_id(id).await?.ok_or_else(user_not_found)?;
    Ok(Json(user.view()))
}

/// `PUT|PATCH /api/users/{id}`; only the fields present in the body change.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ProxyResult<Json<UserEnvelope>> {
    let mut user = state.users.find_by_id(id).await?.ok_or_else(user_not_found)?;

    if let Some(email) = req.email {
        if email != user.email {
            if let Some(other) = state.users.find_by_email(&email).await? {
                if other.id != user.id {
                    return Err(ProxyError::http(StatusCode::CONFLICT, "User already exists"));
                }
            }
        }
        user.email = email;
    }
    if let Some(first_name) = req.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name;
    }
    if let Some(roles) = req.roles {
        user.assigned_roles = roles;
    }
    if let Some(password) = req.password {
        user.password_hash = hash_password(&password)?;
    }

    validate(&user.email, &user.first_name, &user.last_name)?;
    let user = state.users.update(user).await?;

    Ok(Json(UserEnvelope {
        message: "User updated successfully".to_string(),
        user: user.summary(),
    }))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ProxyResult<Json<MessageResponse>> {
    if !state.users.delete(id).await? {
        return Err(user_not_found());
    }
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_plain_addresses() {
        assert!(validate("rick@rickmorty.com", "Rick", "Sanchez").is_ok());
    }

    #[test]
    fn validate_collects_violations() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let err = validate("not-an-email", &long, "Smith").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed"));
        assert!(message.contains("email"));
        assert!(message.contains("firstName"));
        assert_eq!(err.status_and_kind().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert_eq!(present(Some("  ".to_string())), None);
        assert_eq!(present(None), None);
        assert_eq!(present(Some("a".to_string())), Some("a".to_string()));
    }
}
