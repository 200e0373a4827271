// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Coarse route policy and router assembly.
//!
//! The table mirrors the fine-grained policies of the backend services so
//! unauthorized traffic is rejected at the edge instead of consuming
//! backend capacity. Backends still enforce their own tables; the gateway
//! is an optimization, not the only line of defense.

use std::sync::Arc;

use axum::{http::Method, middleware::from_fn_with_state, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use fishpath_auth::{
    authenticate_gateway, authorize, AuthorizationPolicy, GatewayAuth, Role, TokenVerifier,
};

use crate::{proxy, state::GatewayState};

/// Coarse gateway policy, one table per upstream. Ordered: first matching
/// rule wins, unmatched routes require an authenticated identity.
pub fn route_policy() -> AuthorizationPolicy {
    const TREATMENT_OR_ADMIN: &[Role] = &[Role::Treatment, Role::Admin];
    const ADMIN: &[Role] = &[Role::Admin];

    AuthorizationPolicy::builder()
        // Users
        .permit_all(Method::POST, "/auth-service/users/register")
        .permit_all(Method::POST, "/auth-service/users/login")
        .any_of(Method::GET, "/auth-service/users", ADMIN)
        .any_of(Method::GET, "/auth-service/users/{userId}", TREATMENT_OR_ADMIN)
        .authenticated(Method::POST, "/auth-service/users/logout")
        .any_of(Method::PATCH, "/auth-service/users/{userId}", TREATMENT_OR_ADMIN)
        .any_of(
            Method::PUT,
            "/auth-service/users/{userId}/disable",
            TREATMENT_OR_ADMIN,
        )
        .any_of(Method::PUT, "/auth-service/users/{userId}/role-admin", ADMIN)
        .any_of(Method::DELETE, "/auth-service/users/{userId}", ADMIN)
        // Parasites
        .permit_all(Method::GET, "/biodata-service/parasites")
        .permit_all(Method::GET, "/biodata-service/parasites/{parasiteId}")
        .permit_all(Method::GET, "/biodata-service/parasites/sn/{scientificName}")
        .any_of(
            Method::GET,
            "/biodata-service/parasites/fetch/{scientificName}",
            ADMIN,
        )
        .any_of(Method::POST, "/biodata-service/parasites", ADMIN)
        .any_of(
            Method::PATCH,
            "/biodata-service/parasites/{scientificName}",
            ADMIN,
        )
        .any_of(
            Method::DELETE,
            "/biodata-service/parasites/{scientificName}",
            ADMIN,
        )
        // Fishes
        .permit_all(Method::GET, "/biodata-service/fishes")
        .permit_all(Method::GET, "/biodata-service/fishes/{fishId}")
        .permit_all(Method::GET, "/biodata-service/fishes/sn/{scientificName}")
        .any_of(
            Method::GET,
            "/biodata-service/fishes/fetch/{scientificName}",
            ADMIN,
        )
        .any_of(Method::POST, "/biodata-service/fishes", ADMIN)
        .any_of(
            Method::PATCH,
            "/biodata-service/fishes/{scientificName}",
            ADMIN,
        )
        .any_of(
            Method::DELETE,
            "/biodata-service/fishes/{scientificName}",
            ADMIN,
        )
        // Treatments
        .any_of(Method::GET, "/treatment-service/treatments", TREATMENT_OR_ADMIN)
        .any_of(
            Method::GET,
            "/treatment-service/treatments/{id}",
            TREATMENT_OR_ADMIN,
        )
        .any_of(
            Method::GET,
            "/treatment-service/treatments/name/{treatmentName}",
            TREATMENT_OR_ADMIN,
        )
        .any_of(Method::POST, "/treatment-service/treatments", ADMIN)
        .any_of(Method::PATCH, "/treatment-service/treatments/{id}", ADMIN)
        .any_of(Method::DELETE, "/treatment-service/treatments/{id}", ADMIN)
        // Laboratory methods
        .any_of(
            Method::GET,
            "/treatment-service/laboratory-methods",
            TREATMENT_OR_ADMIN,
        )
        .any_of(
            Method::GET,
            "/treatment-service/laboratory-methods/{id}",
            TREATMENT_OR_ADMIN,
        )
        .any_of(
            Method::GET,
            "/treatment-service/laboratory-methods/name/{laboratoryMethodName}",
            TREATMENT_OR_ADMIN,
        )
        .any_of(Method::POST, "/treatment-service/laboratory-methods", ADMIN)
        .any_of(
            Method::PATCH,
            "/treatment-service/laboratory-methods/{id}",
            ADMIN,
        )
        .any_of(
            Method::DELETE,
            "/treatment-service/laboratory-methods/{id}",
            ADMIN,
        )
        .build()
}

/// Build the gateway: every path falls through to the forwarding handler
/// once the security layers pass.
pub fn app(state: GatewayState, verifier: TokenVerifier, policy: AuthorizationPolicy) -> Router {
    secured(
        verifier,
        policy,
        Router::new().fallback(proxy::forward).with_state(state),
    )
}

/// Wrap a router with the gateway's layers.
///
/// Layer order is load-bearing: authentication wraps authorization, so a
/// presented token is verified (or the request rejected) strictly before
/// the policy is evaluated, and both run before anything is forwarded.
pub fn secured(
    verifier: TokenVerifier,
    policy: AuthorizationPolicy,
    inner: Router,
) -> Router {
    let auth = Arc::new(GatewayAuth::new(verifier));

    inner
        .layer(from_fn_with_state(Arc::new(policy), authorize))
        .layer(from_fn_with_state(auth, authenticate_gateway))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use chrono::Duration;
    use fishpath_auth::{Access, SigningKey, TokenIssuer};
    use std::sync::Arc as StdArc;
    use tower::ServiceExt;
    use url::Url;

    fn test_key() -> StdArc<SigningKey> {
        StdArc::new(SigningKey::from_base64_secret(&STANDARD.encode([0x77u8; 32])).unwrap())
    }

    fn token(subject: &str, roles: &[Role]) -> String {
        TokenIssuer::new(test_key(), Duration::hours(24))
            .unwrap()
            .issue(
                subject,
                roles.iter().map(|r| r.as_wire().to_string()).collect(),
            )
            .unwrap()
    }

    /// Gateway stack around a stub downstream, so tests exercise the edge
    /// security without real upstreams.
    fn stub_gateway() -> Router {
        secured(
            TokenVerifier::new(test_key()),
            route_policy(),
            Router::new().fallback(|| async { "forwarded" }),
        )
    }

    fn request(method: Method, path: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn policy_mirrors_the_downstream_tables() {
        let policy = route_policy();

        assert_eq!(
            policy.decide(&Method::POST, "/auth-service/users/login"),
            Access::PermitAll
        );
        assert_eq!(
            policy.decide(&Method::GET, "/biodata-service/fishes/sn/Salmo%20salar"),
            Access::PermitAll
        );
        assert_eq!(
            policy.decide(&Method::POST, "/biodata-service/fishes"),
            Access::AnyOf(vec![Role::Admin])
        );
        assert_eq!(
            policy.decide(&Method::GET, "/treatment-service/treatments"),
            Access::AnyOf(vec![Role::Treatment, Role::Admin])
        );
        assert_eq!(
            policy.decide(&Method::GET, "/auth-service/users"),
            Access::AnyOf(vec![Role::Admin])
        );
        // Anything unmatched needs an identity.
        assert_eq!(
            policy.decide(&Method::GET, "/somewhere/else"),
            Access::Authenticated
        );
    }

    #[tokio::test]
    async fn public_biodata_reads_pass_without_a_token() {
        let response = stub_gateway()
            .oneshot(request(Method::GET, "/biodata-service/fishes", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn treatment_reads_need_a_role() {
        let app = stub_gateway();

        let anonymous = app
            .clone()
            .oneshot(request(Method::GET, "/treatment-service/treatments", None))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let treatment = token("alice", &[Role::Treatment]);
        let allowed = app
            .oneshot(request(
                Method::GET,
                "/treatment-service/treatments",
                Some(&treatment),
            ))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn roleless_token_cannot_reach_admin_routes() {
        let roleless = token("alice", &[]);
        let response = stub_gateway()
            .oneshot(request(
                Method::POST,
                "/biodata-service/parasites",
                Some(&roleless),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn treatment_role_is_not_enough_for_admin_writes() {
        let treatment = token("alice", &[Role::Treatment]);
        let response = stub_gateway()
            .oneshot(request(
                Method::DELETE,
                "/treatment-service/treatments/7",
                Some(&treatment),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_even_on_public_routes() {
        let response = stub_gateway()
            .oneshot(request(
                Method::GET,
                "/biodata-service/fishes",
                Some("junk-token"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let foreign_key = StdArc::new(
            SigningKey::from_base64_secret(&STANDARD.encode([0x78u8; 32])).unwrap(),
        );
        let foreign = TokenIssuer::new(foreign_key, Duration::hours(24))
            .unwrap()
            .issue("alice", vec!["ROLE_ADMIN".to_string()])
            .unwrap();

        let response = stub_gateway()
            .oneshot(request(
                Method::GET,
                "/auth-service/users",
                Some(&foreign),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_prefix_is_404_for_authenticated_callers() {
        let state = GatewayState::new(crate::proxy::Upstreams::new(
            Url::parse("http://localhost:1").unwrap(),
            Url::parse("http://localhost:1").unwrap(),
            Url::parse("http://localhost:1").unwrap(),
        ));
        let app = app(state, TokenVerifier::new(test_key()), route_policy());

        let admin = token("root", &[Role::Admin]);
        let response = app
            .oneshot(request(Method::GET, "/metrics-service/scrape", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502() {
        // Port 9 is the discard service; nothing listens there in CI.
        let state = GatewayState::new(crate::proxy::Upstreams::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Url::parse("http://127.0.0.1:9").unwrap(),
            Url::parse("http://127.0.0.1:9").unwrap(),
        ));
        let app = app(state, TokenVerifier::new(test_key()), route_policy());

        let response = app
            .oneshot(request(Method::GET, "/biodata-service/fishes", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
