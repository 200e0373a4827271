// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! The canonical claim set carried in every token.

use serde::{Deserialize, Serialize};

use crate::{error::AuthError, identity::Identity, roles::Role};

/// Claims embedded in a signed token.
///
/// The wire shape is the standard JWT payload: `sub`, `roles` (array of
/// strings), `iat` and `exp` as numeric Unix timestamps. Role strings that
/// are not recognized locally are preserved as opaque strings, since the
/// verifying side only checks the roles it cares about.
///
/// A missing `exp` deserializes as `None` and is treated as non-expiring.
/// That is a discouraged edge case kept for wire compatibility; the issuer
/// always sets an expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the unique username.
    pub sub: String,
    /// Role wire strings, unknown entries preserved.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch. Absent means non-expiring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Build a validated claim set.
    ///
    /// # Errors
    /// Returns [`AuthError::MalformedToken`] for an empty subject or an
    /// expiry that does not lie strictly after the issue time.
    pub fn new(
        sub: impl Into<String>,
        roles: Vec<String>,
        iat: i64,
        exp: Option<i64>,
    ) -> Result<Self, AuthError> {
        let sub = sub.into();
        if sub.is_empty() {
            return Err(AuthError::MalformedToken);
        }
        if let Some(exp) = exp {
            if exp <= iat {
                return Err(AuthError::MalformedToken);
            }
        }
        Ok(Self {
            sub,
            roles,
            iat,
            exp,
        })
    }

    /// True iff an expiry is present and `now` has reached it.
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.exp, Some(exp) if now >= exp)
    }

    /// Project the claim set into an [`Identity`], keeping only the roles
    /// recognized locally.
    pub fn identity(&self) -> Identity {
        let roles: Vec<Role> = self
            .roles
            .iter()
            .filter_map(|r| Role::from_wire(r))
            .collect();
        Identity::new(self.sub.clone(), roles)
    }
}
