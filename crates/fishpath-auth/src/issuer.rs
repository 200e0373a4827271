// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Token issuance for authenticated identities.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::Header;

use crate::{claims::Claims, error::AuthError, keys::SigningKey};

/// Issues signed tokens for identities the authentication service has
/// already validated.
///
/// Issuance is stateless: nothing is persisted and issued tokens cannot be
/// revoked, so a token stays valid until its natural expiry. The validity
/// window is fixed per deployment (24 hours by default) and must be
/// consistent with the services the token will be presented to.
pub struct TokenIssuer {
    key: Arc<SigningKey>,
    validity: Duration,
}

impl TokenIssuer {
    /// Create an issuer with the given validity window.
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] for a zero or negative window;
    /// like a weak secret, that is a deployment error caught at startup.
    pub fn new(key: Arc<SigningKey>, validity: Duration) -> Result<Self, AuthError> {
        if validity <= Duration::zero() {
            return Err(AuthError::Configuration(
                "token validity must be positive".to_string(),
            ));
        }
        Ok(Self { key, validity })
    }

    /// Issue a signed token for `subject` holding `roles`.
    ///
    /// Embeds `iat = now` and `exp = now + validity` and signs with the
    /// shared HS256 key.
    pub fn issue(&self, subject: &str, roles: Vec<String>) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims::new(subject, roles, now, Some(now + self.validity.num_seconds()))?;

        jsonwebtoken::encode(
            &Header::new(SigningKey::algorithm()),
            &claims,
            self.key.encoding(),
        )
        .map_err(|e| AuthError::Configuration(format!("token signing failed: {e}")))
    }
}
