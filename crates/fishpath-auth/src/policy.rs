// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Route authorization policy.
//!
//! Each service declares an ordered table of (method, path pattern) →
//! required access at startup; the table is immutable afterwards and
//! consulted once per request, after authentication has run. The first
//! matching rule wins; routes no rule matches fall back to requiring an
//! authenticated identity.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AuthError, identity::Identity, roles::Role};

/// Access requirement of a matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// No identity required.
    PermitAll,
    /// The identity must hold at least one of these roles (logical OR).
    AnyOf(Vec<Role>),
    /// Any valid identity suffices.
    Authenticated,
}

impl Access {
    /// Evaluate the requirement against the identity established for this
    /// request.
    ///
    /// # Errors
    /// [`AuthError::AuthenticationRequired`] (401) when an identity is
    /// needed and absent; [`AuthError::InsufficientRole`] (403) when the
    /// identity holds none of the required roles.
    pub fn check(&self, identity: Option<&Identity>) -> Result<(), AuthError> {
        match self {
            Access::PermitAll => Ok(()),
            Access::Authenticated => identity
                .map(|_| ())
                .ok_or(AuthError::AuthenticationRequired),
            Access::AnyOf(roles) => {
                let identity = identity.ok_or(AuthError::AuthenticationRequired)?;
                if identity.has_any(roles) {
                    Ok(())
                } else {
                    Err(AuthError::InsufficientRole)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable,
}

/// A path pattern where a `{name}` segment matches exactly one non-empty
/// path segment.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = raw
            .split('/')
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') && s.len() > 2 {
                    Segment::Variable
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { raw, segments }
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut candidate = path.split('/');
        let mut expected = self.segments.iter();
        loop {
            match (expected.next(), candidate.next()) {
                (None, None) => return true,
                (None, Some(_)) | (Some(_), None) => return false,
                (Some(Segment::Variable), Some(seg)) => {
                    if seg.is_empty() {
                        return false;
                    }
                }
                (Some(Segment::Literal(lit)), Some(seg)) => {
                    if lit != seg {
                        return false;
                    }
                }
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// One row of the policy table.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub method: Method,
    pub pattern: PathPattern,
    pub access: Access,
}

impl RouteRule {
    pub fn new(method: Method, pattern: impl Into<String>, access: Access) -> Self {
        Self {
            method,
            pattern: PathPattern::new(pattern),
            access,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.pattern.matches(path)
    }
}

/// Immutable, startup-constructed route policy.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicy {
    rules: Vec<RouteRule>,
}

impl AuthorizationPolicy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Resolve the access requirement for a request. First matching rule
    /// wins; unmatched routes require authentication.
    pub fn decide(&self, method: &Method, path: &str) -> Access {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.access.clone())
            .unwrap_or(Access::Authenticated)
    }
}

/// Ordered builder for [`AuthorizationPolicy`]; declaration order is match
/// order.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    rules: Vec<RouteRule>,
}

impl PolicyBuilder {
    pub fn permit_all(mut self, method: Method, pattern: &str) -> Self {
        self.rules
            .push(RouteRule::new(method, pattern, Access::PermitAll));
        self
    }

    pub fn authenticated(mut self, method: Method, pattern: &str) -> Self {
        self.rules
            .push(RouteRule::new(method, pattern, Access::Authenticated));
        self
    }

    pub fn any_of(mut self, method: Method, pattern: &str, roles: &[Role]) -> Self {
        self.rules
            .push(RouteRule::new(method, pattern, Access::AnyOf(roles.to_vec())));
        self
    }

    pub fn build(self) -> AuthorizationPolicy {
        AuthorizationPolicy { rules: self.rules }
    }
}

/// Authorization middleware.
///
/// Must be layered so the authentication middleware runs first: it reads
/// the identity that layer bound into the request extensions. Requests that
/// fail the policy never reach route dispatch.
pub async fn authorize(
    State(policy): State<Arc<AuthorizationPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let access = policy.decide(request.method(), request.uri().path());
    let identity = request.extensions().get::<Identity>();

    if let Err(e) = access.check(identity) {
        tracing::debug!(
            method = %request.method(),
            path = request.uri().path(),
            subject = identity.map(|i| i.subject.as_str()).unwrap_or("-"),
            "request rejected by route policy: {e}"
        );
        return e.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roles: &[Role]) -> Identity {
        Identity::new("alice", roles.to_vec())
    }

    #[test]
    fn variable_segment_matches_exactly_one_segment() {
        let pattern = PathPattern::new("/users/{userId}");
        assert!(pattern.matches("/users/42"));
        assert!(pattern.matches("/users/alice"));
        assert!(!pattern.matches("/users"));
        assert!(!pattern.matches("/users/42/disable"));
        assert!(!pattern.matches("/users//"));
    }

    #[test]
    fn literal_segments_match_exactly() {
        let pattern = PathPattern::new("/users/{userId}/disable");
        assert!(pattern.matches("/users/42/disable"));
        assert!(!pattern.matches("/users/42/enable"));
    }

    #[test]
    fn first_matching_rule_wins() {
        let policy = AuthorizationPolicy::builder()
            .permit_all(Method::GET, "/users/{userId}")
            .any_of(Method::GET, "/users/{userId}", &[Role::Admin])
            .build();

        assert_eq!(policy.decide(&Method::GET, "/users/42"), Access::PermitAll);
    }

    #[test]
    fn method_discriminates() {
        let policy = AuthorizationPolicy::builder()
            .permit_all(Method::POST, "/users/login")
            .build();

        assert_eq!(
            policy.decide(&Method::POST, "/users/login"),
            Access::PermitAll
        );
        assert_eq!(
            policy.decide(&Method::GET, "/users/login"),
            Access::Authenticated
        );
    }

    #[test]
    fn unmatched_routes_require_authentication() {
        let policy = AuthorizationPolicy::builder().build();
        assert_eq!(
            policy.decide(&Method::DELETE, "/anything"),
            Access::Authenticated
        );
    }

    #[test]
    fn permit_all_needs_no_identity() {
        assert!(Access::PermitAll.check(None).is_ok());
    }

    #[test]
    fn authenticated_rejects_missing_identity() {
        let err = Access::Authenticated.check(None).unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationRequired));
        assert!(Access::Authenticated.check(Some(&identity(&[]))).is_ok());
    }

    #[test]
    fn role_gate_rejects_empty_role_set_with_403() {
        let access = Access::AnyOf(vec![Role::Admin]);
        let err = access.check(Some(&identity(&[]))).unwrap_err();
        assert!(matches!(err, AuthError::InsufficientRole));
    }

    #[test]
    fn any_required_role_suffices() {
        let access = Access::AnyOf(vec![Role::Treatment, Role::Admin]);
        assert!(access.check(Some(&identity(&[Role::Treatment]))).is_ok());
        assert!(access.check(Some(&identity(&[Role::Admin]))).is_ok());
    }

    #[test]
    fn role_gate_without_identity_is_401_not_403() {
        let access = Access::AnyOf(vec![Role::Admin]);
        let err = access.check(None).unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationRequired));
    }
}
