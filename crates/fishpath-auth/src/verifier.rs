// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Token verification and claims extraction.

use std::sync::Arc;

use jsonwebtoken::{errors::ErrorKind, Validation};

use crate::{claims::Claims, error::AuthError, keys::SigningKey};

/// Verifies incoming tokens against the shared key.
///
/// Verification is pure CPU work on the calling thread, no I/O, so it is
/// safe to run inside the gateway's non-blocking dispatch as well as on the
/// authentication service's worker threads.
pub struct TokenVerifier {
    key: Arc<SigningKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(key: Arc<SigningKey>) -> Self {
        let mut validation = Validation::new(SigningKey::algorithm());
        validation.validate_exp = true;
        // Expiry is exact; skew tolerance is a deployment concern, not ours.
        validation.leeway = 0;
        validation.validate_aud = false;
        // A token without `exp` is accepted as non-expiring rather than
        // rejected for the missing claim.
        validation.required_spec_claims = std::collections::HashSet::new();

        Self { key, validation }
    }

    /// Decode, signature-check, and expiry-check a token.
    ///
    /// # Errors
    /// - [`AuthError::MalformedToken`] when the compact structure or payload
    ///   does not decode
    /// - [`AuthError::InvalidSignature`] on signature mismatch (tampering or
    ///   a different secret)
    /// - [`AuthError::TokenExpired`] when the signature is valid but the
    ///   expiry has passed
    pub fn parse(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, self.key.decoding(), &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }

    /// The token's subject. Projection of [`parse`](Self::parse) with the
    /// same failure modes.
    pub fn extract_username(&self, token: &str) -> Result<String, AuthError> {
        Ok(self.parse(token)?.sub)
    }

    /// The token's role strings, unknown entries preserved. Projection of
    /// [`parse`](Self::parse) with the same failure modes.
    pub fn extract_roles(&self, token: &str) -> Result<Vec<String>, AuthError> {
        Ok(self.parse(token)?.roles)
    }

    /// Whether the token is valid for the expected username.
    ///
    /// `Ok(true)` iff the token parses, its subject equals
    /// `expected_username` exactly (case-sensitive), and it is not expired.
    /// Expiry and subject mismatch are reported as `Ok(false)`, while
    /// malformed or wrongly-signed tokens propagate as `Err` so the HTTP
    /// boundary translates them to 401. Callers must preserve this
    /// asymmetry: a tampered token is an error, a stale or foreign one is
    /// merely invalid.
    pub fn is_token_valid(
        &self,
        token: &str,
        expected_username: &str,
    ) -> Result<bool, AuthError> {
        match self.parse(token) {
            Ok(claims) => Ok(claims.sub == expected_username),
            Err(AuthError::TokenExpired) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
