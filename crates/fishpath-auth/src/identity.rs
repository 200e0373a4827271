// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! The authenticated principal and the identity-store seam.

use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// The authenticated principal for the current request.
///
/// An `Identity` is re-derived on every request (from the token claims alone
/// at the gateway, from the user store at the authentication service) and
/// lives only in the request's extensions. It is never persisted and never
/// shared across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique username (the token's `sub` claim).
    pub subject: String,
    /// Recognized roles held by the principal.
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn new(subject: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }

    /// Whether the principal holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether the principal holds at least one of the given roles.
    pub fn has_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Lookup seam to the user store.
///
/// Implemented by the authentication service's store; this crate only
/// consumes it. The call may block the handling worker thread, which the
/// blocking-side interceptor tolerates, so it must not run on a
/// non-blocking dispatch path. The gateway never looks identities up and
/// trusts the token signature alone.
pub trait IdentityLookup: Send + Sync {
    /// Resolve the full identity for a subject, or `None` if unknown.
    fn find_by_subject(&self, subject: &str) -> Option<Identity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_role_matches_exactly() {
        let identity = Identity::new("alice", vec![Role::Treatment]);
        assert!(identity.has_role(Role::Treatment));
        assert!(!identity.has_role(Role::Admin));
        assert!(!identity.is_admin());
    }

    #[test]
    fn has_any_is_a_logical_or() {
        let identity = Identity::new("bob", vec![Role::Treatment]);
        assert!(identity.has_any(&[Role::Treatment, Role::Admin]));
        assert!(!identity.has_any(&[Role::Admin]));
        assert!(!identity.has_any(&[]));
    }

    #[test]
    fn roles_are_additive() {
        let identity = Identity::new("carol", vec![Role::Treatment, Role::Admin]);
        assert!(identity.has_role(Role::Treatment));
        assert!(identity.is_admin());
    }
}
