// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

use std::sync::Arc;

use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use fishpath_auth::{
    authenticate_blocking, authorize, AuthorizationPolicy, BlockingAuth, Role, TokenVerifier,
};

use crate::state::AppState;

pub mod users;

/// Fine-grained route policy for this service.
///
/// Ordered: the first matching rule wins, unmatched routes require an
/// authenticated identity. Resource-level ownership rules are layered on
/// top of this table inside the handlers.
fn route_policy() -> AuthorizationPolicy {
    const TREATMENT_OR_ADMIN: &[Role] = &[Role::Treatment, Role::Admin];
    const ADMIN: &[Role] = &[Role::Admin];

    AuthorizationPolicy::builder()
        .permit_all(Method::POST, "/users/register")
        .permit_all(Method::POST, "/users/login")
        .authenticated(Method::POST, "/users/logout")
        .any_of(Method::GET, "/users/{userId}", TREATMENT_OR_ADMIN)
        .any_of(Method::PUT, "/users/{userId}/role-admin", ADMIN)
        .any_of(Method::PUT, "/users/{userId}", TREATMENT_OR_ADMIN)
        .any_of(Method::PATCH, "/users/{userId}", TREATMENT_OR_ADMIN)
        .any_of(Method::PUT, "/users/{userId}/disable", TREATMENT_OR_ADMIN)
        .any_of(Method::GET, "/users", ADMIN)
        .any_of(Method::DELETE, "/users/{userId}", ADMIN)
        .build()
}

/// Build the service router.
///
/// Layer order is load-bearing: the authentication middleware wraps the
/// authorization middleware, so every request is authenticated (or
/// rejected) before the policy is evaluated, and authorized before any
/// handler runs.
pub fn router(state: AppState, verifier: TokenVerifier) -> Router {
    let auth = Arc::new(BlockingAuth::new(
        verifier,
        Arc::new(state.users.clone()),
        vec!["/users/register".to_string(), "/users/login".to_string()],
    ));
    let policy = Arc::new(route_policy());

    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{user_id}/role-admin", put(users::promote_admin))
        .route("/users/{user_id}/disable", put(users::disable_user))
        .layer(from_fn_with_state(policy, authorize))
        .layer(from_fn_with_state(auth, authenticate_blocking))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
