// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! Signing-key derivation from the shared secret.
//!
//! Both services are configured out of band with the same base64-encoded
//! secret; everything downstream (issuance at the authentication service,
//! verification at the gateway and the backends) derives its key material
//! here, so the two sides cannot drift apart in algorithm or encoding.

use base64ct::{Base64, Encoding};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::error::AuthError;

/// Minimum decoded secret length for the HMAC-SHA-256 construction, per
/// RFC 7518 §3.2 (the key must be at least as long as the hash output).
pub const MIN_SECRET_LEN: usize = 32;

/// Symmetric HS256 key pair derived from the configured secret.
///
/// Pure function of configuration: derivation has no side effects and the
/// resulting keys are safe for unlimited concurrent use.
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Derive the key pair from a base64-encoded secret.
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] when the secret is not valid
    /// base64 or the decoded material is shorter than [`MIN_SECRET_LEN`]
    /// bytes. Both cases must abort process start.
    pub fn from_base64_secret(secret: &str) -> Result<Self, AuthError> {
        let decoded = Base64::decode_vec(secret.trim())
            .map_err(|_| AuthError::Configuration("secret is not valid base64".to_string()))?;

        if decoded.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "secret is {} bytes after decoding, HMAC-SHA-256 requires at least {}",
                decoded.len(),
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(&decoded),
            decoding: DecodingKey::from_secret(&decoded),
        })
    }

    /// The signature algorithm both sides must agree on.
    pub fn algorithm() -> Algorithm {
        Algorithm::HS256
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for SigningKey {
    // Never expose key material through Debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}
