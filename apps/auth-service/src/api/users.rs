// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! User endpoints.
//!
//! Route-level role requirements live in the policy table; the handlers
//! here add the resource-level rule layered on top of it: a non-admin may
//! only touch the user record that matches their own subject.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fishpath_auth::{Identity, RequireIdentity, Role};

use crate::{
    error::ApiError,
    state::AppState,
    store::{StoreError, UserRecord},
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: u64,
    pub username: String,
    pub roles: Vec<Role>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            roles: user.roles,
            enabled: user.enabled,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
}

/// The subject may act on this record if it is their own or they are admin.
fn ensure_own_record_or_admin(identity: &Identity, record: &UserRecord) -> Result<(), ApiError> {
    if record.username == identity.subject || identity.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You may only access your own user record",
        ))
    }
}

/// Create a new user with the default treatment role. Public route.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("Username must not be empty"));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let created = state
        .users
        .write(|store| store.register(username, &request.password))
        .map_err(|e| match e {
            StoreError::DuplicateUsername => ApiError::conflict("Username is already taken"),
        })?;

    tracing::info!(username, user_id = created.user_id, "user registered");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Validate credentials and issue a signed token. Public route.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some(user) = state
        .users
        .read(|store| store.authenticate(&request.username, &request.password))
    else {
        tracing::debug!(username = %request.username, "login rejected");
        return Err(ApiError::unauthorized("Invalid username or password"));
    };

    state.users.write(|store| store.record_login(&user.username));

    let roles = user.roles.iter().map(|r| r.as_wire().to_string()).collect();
    let token = state
        .issuer
        .issue(&user.username, roles)
        .map_err(|e| {
            tracing::error!("token issuance failed: {e}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Token issuance failed")
        })?;

    tracing::info!(username = %user.username, "login successful");
    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
    }))
}

/// Tokens are not revocable; logout is the client discarding its token.
/// The route still requires a valid identity so an expired session gets a
/// clean 401 instead of a silent no-op.
pub async fn logout(RequireIdentity(identity): RequireIdentity) -> Json<MessageResponse> {
    tracing::info!(subject = %identity.subject, "logout");
    Json(MessageResponse {
        message: "Logout successful",
    })
}

pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserResponse>> {
    let users = state.users.read(|store| store.list());
    Json(users.into_iter().map(UserResponse::from).collect())
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Json<UserResponse>, ApiError> {
    let record = state
        .users
        .read(|store| store.find_by_id(user_id))
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    ensure_own_record_or_admin(&identity, &record)?;
    Ok(Json(record.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    RequireIdentity(identity): RequireIdentity,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let record = state
        .users
        .read(|store| store.find_by_id(user_id))
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    ensure_own_record_or_admin(&identity, &record)?;

    let updated = match request.password {
        Some(password) => {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(ApiError::bad_request(
                    "Password must be at least 8 characters",
                ));
            }
            state
                .users
                .write(|store| store.update_password(user_id, &password))
                .ok_or_else(|| ApiError::not_found("User not found"))?
        }
        None => record,
    };

    Ok(Json(updated.into()))
}

/// Grant the admin role. The policy table restricts this route to admins.
pub async fn promote_admin(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserResponse>, ApiError> {
    let promoted = state
        .users
        .write(|store| store.promote_admin(user_id))
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(username = %promoted.username, "admin role granted");
    Ok(Json(promoted.into()))
}

/// Disable an account. Its outstanding tokens stop resolving to an
/// identity on the next request.
pub async fn disable_user(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Json<MessageResponse>, ApiError> {
    let record = state
        .users
        .read(|store| store.find_by_id(user_id))
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    ensure_own_record_or_admin(&identity, &record)?;

    state.users.write(|store| store.disable(user_id));
    tracing::info!(username = %record.username, "user disabled");
    Ok(Json(MessageResponse {
        message: "User disabled",
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.users.write(|store| store.delete(user_id)) {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(MessageResponse {
        message: "User deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_carries_no_credential_material() {
        let mut store = crate::store::InMemoryUserStore::new();
        let record = store.register("alice", "password-1").unwrap();

        let response: UserResponse = record.into();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["username"], "alice");
        assert!(json.get("digest").is_none());
        assert!(json.get("salt").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn own_record_or_admin_rule() {
        let mut store = crate::store::InMemoryUserStore::new();
        let alice = store.register("alice", "password-1").unwrap();

        let own = Identity::new("alice", vec![Role::Treatment]);
        let admin = Identity::new("root", vec![Role::Admin]);
        let other = Identity::new("bob", vec![Role::Treatment]);

        assert!(ensure_own_record_or_admin(&own, &alice).is_ok());
        assert!(ensure_own_record_or_admin(&admin, &alice).is_ok());
        assert!(ensure_own_record_or_admin(&other, &alice).is_err());
    }
}
