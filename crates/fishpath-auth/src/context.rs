// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Request-scoped access to the authenticated identity.
//!
//! The authentication middleware binds an [`Identity`] into the request's
//! extensions; these extractors are how downstream code reads it back.
//! Resource-level business rules ("the subject owns the target user id, or
//! is an admin") are built on [`CurrentIdentity`] in the service handlers.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AuthError, identity::Identity};

/// The identity established for this request, if any.
///
/// Never rejects: public handlers can use it to branch on authentication
/// without forcing it.
pub struct CurrentIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentIdentity(parts.extensions.get::<Identity>().cloned()))
    }
}

/// Extractor for handlers that cannot run unauthenticated.
///
/// Rejects with 401 when the authentication middleware established no
/// identity. Route-level gating normally happens in the policy layer; this
/// is the belt-and-braces form for handlers that read the identity anyway.
pub struct RequireIdentity(pub Identity);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(RequireIdentity)
            .ok_or(AuthError::AuthenticationRequired)
    }
}
