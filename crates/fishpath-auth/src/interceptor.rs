// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Authentication middleware.
//!
//! Two variants with identical token logic but different trust models:
//!
//! - [`authenticate_blocking`] runs inside the authentication service. It
//!   resolves the full identity from the user store (a collaborator call
//!   that may block the worker thread) and only trusts a token whose
//!   subject matches a stored user.
//! - [`authenticate_gateway`] runs at the edge. The gateway owns no user
//!   store, so the identity is built from the token claims alone: the
//!   HMAC signature is the trust anchor.
//!
//! Both bind the resulting [`Identity`] into the request extensions: an
//! immutable request-scoped value that survives task hops, never a
//! thread-local. Within a request, authentication completes strictly
//! before the authorization layer runs, which completes strictly before
//! route dispatch; services must preserve that layering.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{identity::IdentityLookup, verifier::TokenVerifier};

/// The token presented in an `Authorization: Bearer <token>` header, if any.
///
/// A missing header, a non-UTF-8 value, or a non-Bearer scheme all read as
/// "no token": the request proceeds unauthenticated and route policy
/// decides whether that is acceptable.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// State for the service-side authentication middleware.
pub struct BlockingAuth {
    verifier: TokenVerifier,
    identities: Arc<dyn IdentityLookup>,
    skip_paths: Vec<String>,
}

impl BlockingAuth {
    /// `skip_paths` are matched literally against the request path and
    /// bypass interception entirely. These are the service's public routes
    /// (registration and login).
    pub fn new(
        verifier: TokenVerifier,
        identities: Arc<dyn IdentityLookup>,
        skip_paths: Vec<String>,
    ) -> Self {
        Self {
            verifier,
            identities,
            skip_paths,
        }
    }
}

/// Service-side authentication.
///
/// A bearer token that fails to parse rejects the request with 401 before
/// dispatch. A token that parses but does not validate against the stored
/// identity (foreign subject, expired) leaves the request unauthenticated;
/// the policy layer then rejects it wherever a role or identity is
/// required.
pub async fn authenticate_blocking(
    State(auth): State<Arc<BlockingAuth>>,
    mut request: Request,
    next: Next,
) -> Response {
    if auth.skip_paths.iter().any(|p| p == request.uri().path()) {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        return next.run(request).await;
    };

    let username = match auth.verifier.extract_username(&token) {
        Ok(username) => username,
        Err(e) => {
            tracing::debug!(path = request.uri().path(), "rejected bearer token: {e}");
            return e.into_response();
        }
    };

    // Blocking collaborator call; tolerated on this deployment's worker
    // threads.
    if let Some(identity) = auth.identities.find_by_subject(&username) {
        match auth.verifier.is_token_valid(&token, &identity.subject) {
            Ok(true) => {
                request.extensions_mut().insert(identity);
            }
            Ok(false) => {
                tracing::debug!(subject = %username, "token not valid for stored identity");
            }
            Err(e) => return e.into_response(),
        }
    } else {
        tracing::debug!(subject = %username, "token subject unknown to the identity store");
    }

    next.run(request).await
}

/// State for the gateway-side authentication middleware.
pub struct GatewayAuth {
    verifier: TokenVerifier,
}

impl GatewayAuth {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

/// Gateway-side authentication.
///
/// Runs on the non-blocking dispatch path: token verification is pure CPU
/// work and nothing here performs I/O. Any failure to extract claims from a
/// presented token short-circuits with 401 and the downstream stages are
/// never invoked; a request without a bearer header proceeds
/// unauthenticated for the policy layer to judge.
pub async fn authenticate_gateway(
    State(auth): State<Arc<GatewayAuth>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()).map(str::to_owned) {
        match auth.verifier.parse(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims.identity());
            }
            Err(e) => {
                tracing::debug!(path = request.uri().path(), "rejected bearer token: {e}");
                return e.into_response();
            }
        }
    }

    next.run(request).await
}
