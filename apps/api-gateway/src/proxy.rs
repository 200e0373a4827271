// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Upstream selection and request forwarding.
//!
//! The first path segment names the backend (`/auth-service`,
//! `/biodata-service`, `/treatment-service`); it is stripped before the
//! request is forwarded, so upstreams see their own native paths. Requests
//! only reach this handler after the authentication and authorization
//! layers have passed, and the bearer header is forwarded untouched so the
//! backend can re-verify the same token against the shared secret.

use axum::{
    body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::{error::ApiError, state::GatewayState};

/// Upper bound on a forwarded request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Hop-by-hop headers that must not cross the proxy, plus `Host`, which the
/// client sets for each leg itself.
const STRIPPED_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// The backend base URLs, fixed at startup.
#[derive(Debug)]
pub struct Upstreams {
    auth: Url,
    biodata: Url,
    treatment: Url,
}

impl Upstreams {
    pub fn new(auth: Url, biodata: Url, treatment: Url) -> Self {
        Self {
            auth,
            biodata,
            treatment,
        }
    }

    fn base_for(&self, service: &str) -> Option<&Url> {
        match service {
            "auth-service" => Some(&self.auth),
            "biodata-service" => Some(&self.biodata),
            "treatment-service" => Some(&self.treatment),
            _ => None,
        }
    }

    /// Map a gateway path to the upstream target URL, stripping the
    /// service prefix. `None` when the first segment names no backend.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<String> {
        let trimmed = path.strip_prefix('/')?;
        let (service, rest) = match trimmed.split_once('/') {
            Some((service, rest)) => (service, rest),
            None => (trimmed, ""),
        };
        let base = self.base_for(service)?;

        let mut target = format!("{}/{rest}", base.as_str().trim_end_matches('/'));
        if let Some(query) = query {
            target.push('?');
            target.push_str(query);
        }
        Some(target)
    }
}

fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in STRIPPED_HEADERS {
        forwarded.remove(name);
    }
    forwarded
}

/// Fallback handler: forward an authorized request to its backend and relay
/// the response.
pub async fn forward(State(state): State<GatewayState>, request: Request) -> Response {
    let path = request.uri().path().to_owned();
    let query = request.uri().query().map(str::to_owned);

    let Some(target) = state.upstreams.resolve(&path, query.as_deref()) else {
        tracing::debug!(path, "no upstream for request");
        return ApiError::not_found("Unknown service").into_response();
    };

    let method = request.method().clone();
    let headers = forwardable_headers(request.headers());
    let body = match body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ApiError::payload_too_large("Request body too large").into_response();
        }
    };

    tracing::debug!(%method, url = %target, "forwarding request");

    let upstream = match state
        .client
        .request(method, target.as_str())
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::warn!(url = %target, "upstream request failed: {e}");
            return ApiError::bad_gateway("Upstream service unavailable").into_response();
        }
    };

    let status = upstream.status();
    let response_headers = forwardable_headers(upstream.headers());
    match upstream.bytes().await {
        Ok(bytes) => {
            let mut response = (status, bytes).into_response();
            *response.headers_mut() = response_headers;
            response
        }
        Err(e) => {
            tracing::warn!(url = %target, "failed to read upstream response: {e}");
            ApiError::bad_gateway("Upstream service unavailable").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstreams() -> Upstreams {
        Upstreams::new(
            Url::parse("http://auth:8081").unwrap(),
            Url::parse("http://biodata:8082/").unwrap(),
            Url::parse("http://treatment:8083").unwrap(),
        )
    }

    #[test]
    fn resolve_strips_the_service_prefix() {
        let upstreams = upstreams();
        assert_eq!(
            upstreams.resolve("/auth-service/users/login", None).unwrap(),
            "http://auth:8081/users/login"
        );
        assert_eq!(
            upstreams
                .resolve("/biodata-service/parasites/sn/Gyrodactylus%20salaris", None)
                .unwrap(),
            "http://biodata:8082/parasites/sn/Gyrodactylus%20salaris"
        );
    }

    #[test]
    fn resolve_keeps_the_query_string() {
        let upstreams = upstreams();
        assert_eq!(
            upstreams
                .resolve("/treatment-service/treatments", Some("page=2&size=10"))
                .unwrap(),
            "http://treatment:8083/treatments?page=2&size=10"
        );
    }

    #[test]
    fn resolve_handles_a_bare_service_prefix() {
        let upstreams = upstreams();
        assert_eq!(
            upstreams.resolve("/auth-service", None).unwrap(),
            "http://auth:8081/"
        );
    }

    #[test]
    fn unknown_prefixes_do_not_resolve() {
        let upstreams = upstreams();
        assert!(upstreams.resolve("/metrics", None).is_none());
        assert!(upstreams.resolve("/", None).is_none());
    }

    #[test]
    fn authorization_header_is_forwarded_but_host_is_not() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer token".parse().unwrap());
        headers.insert(header::HOST, "gateway.fishpath.example".parse().unwrap());
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());

        let forwarded = forwardable_headers(&headers);
        assert!(forwarded.contains_key(header::AUTHORIZATION));
        assert!(!forwarded.contains_key(header::HOST));
        assert!(!forwarded.contains_key(header::CONNECTION));
    }
}
