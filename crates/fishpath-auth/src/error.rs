// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while configuring keys, verifying tokens, or evaluating
/// route authorization.
///
/// `Configuration` is fatal: it is only produced at startup and must abort
/// process start rather than be served as a response.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The configured signing secret is missing, not valid base64, or too
    /// weak for the signature algorithm.
    #[error("invalid signing configuration: {0}")]
    Configuration(String),
    /// The token does not decode as a compact JWS structure.
    #[error("token is malformed")]
    MalformedToken,
    /// The token decodes but its signature does not match the shared key.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Signature is valid but the token is past its expiry.
    #[error("token has expired")]
    TokenExpired,
    /// The route requires an authenticated identity and none was established.
    #[error("authentication is required")]
    AuthenticationRequired,
    /// The identity is authenticated but holds none of the required roles.
    #[error("insufficient role")]
    InsufficientRole,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl AuthError {
    /// HTTP status this error maps to at the boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }

    /// Message placed in the response body.
    ///
    /// Malformed and invalid-signature tokens share one generic message so a
    /// caller cannot distinguish structural from cryptographic rejection.
    /// Expired tokens get their own message so clients can prompt re-login.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "Internal authentication error",
            AuthError::MalformedToken | AuthError::InvalidSignature => {
                "Invalid authentication token"
            }
            AuthError::TokenExpired => "Token has expired",
            AuthError::AuthenticationRequired => "Authentication is required",
            AuthError::InsufficientRole => "Insufficient permissions for this operation",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.public_message(),
        });
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn token_errors_return_401_with_error_body() {
        let response = AuthError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "Token has expired");
    }

    #[tokio::test]
    async fn insufficient_role_returns_403() {
        let response = AuthError::InsufficientRole.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn malformed_and_bad_signature_share_a_message() {
        assert_eq!(
            AuthError::MalformedToken.public_message(),
            AuthError::InvalidSignature.public_message()
        );
        // Internal Display stays distinct for logging.
        assert_ne!(
            AuthError::MalformedToken.to_string(),
            AuthError::InvalidSignature.to_string()
        );
    }
}
