// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! User roles for authorization.

use serde::{Deserialize, Serialize};

/// Roles recognized by the platform.
///
/// The set is closed: every permission decision is expressed over these two
/// tiers. Roles are additive (a user may hold both) and the wire strings
/// carried in the token's `roles` claim are `ROLE_TREATMENT` and
/// `ROLE_ADMIN`. Role strings the verifying side does not recognize are
/// ignored rather than rejected, so new roles can be introduced without
/// breaking older services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Treatment staff: may read treatment and laboratory-method data and
    /// manage their own account.
    #[serde(rename = "ROLE_TREATMENT")]
    Treatment,
    /// Full administrative access.
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// Parse a role from its wire string. Unknown strings yield `None`.
    pub fn from_wire(s: &str) -> Option<Role> {
        match s {
            "ROLE_TREATMENT" => Some(Role::Treatment),
            "ROLE_ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    /// The string embedded in the token's `roles` claim.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Treatment => "ROLE_TREATMENT",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_wire_parses_known_roles() {
        assert_eq!(Role::from_wire("ROLE_TREATMENT"), Some(Role::Treatment));
        assert_eq!(Role::from_wire("ROLE_ADMIN"), Some(Role::Admin));
    }

    #[test]
    fn from_wire_rejects_unknown_and_case_variants() {
        assert_eq!(Role::from_wire("ROLE_SUPPORT"), None);
        assert_eq!(Role::from_wire("role_admin"), None);
        assert_eq!(Role::from_wire(""), None);
    }

    #[test]
    fn wire_round_trip() {
        for role in [Role::Treatment, Role::Admin] {
            assert_eq!(Role::from_wire(role.as_wire()), Some(role));
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, r#""ROLE_ADMIN""#);
        let role: Role = serde_json::from_str(r#""ROLE_TREATMENT""#).unwrap();
        assert_eq!(role, Role::Treatment);
    }
}
