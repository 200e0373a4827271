// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! # FishPath Authentication Core
//!
//! Shared JWT authentication and authorization layer used by the API gateway
//! and the authentication service. Both sides are configured with the same
//! base64-encoded HMAC secret, so a token issued by the authentication
//! service verifies byte-for-byte at the gateway and at every backend.
//!
//! ## Auth Flow
//!
//! 1. Client sends credentials to the authentication service
//! 2. The service validates them against its user store and issues a signed
//!    token (`sub`, `roles`, `iat`, `exp`)
//! 3. The client presents `Authorization: Bearer <token>` on every call
//! 4. An authentication middleware establishes a request-scoped [`Identity`]
//!    (or rejects the request with 401)
//! 5. The route policy is evaluated against that identity (403 on missing
//!    role) before the request reaches business logic
//!
//! ## Security
//!
//! - HS256 with a minimum 256-bit secret; weak secrets abort startup
//! - Structure and signature failures share one generic 401 message
//! - Tokens are not revocable; logout is client-side discard

pub mod claims;
pub mod context;
pub mod error;
pub mod identity;
pub mod interceptor;
pub mod issuer;
pub mod keys;
pub mod policy;
pub mod roles;
pub mod verifier;

pub use claims::Claims;
pub use context::{CurrentIdentity, RequireIdentity};
pub use error::AuthError;
pub use identity::{Identity, IdentityLookup};
pub use interceptor::{authenticate_blocking, authenticate_gateway, BlockingAuth, GatewayAuth};
pub use issuer::TokenIssuer;
pub use keys::SigningKey;
pub use policy::{authorize, Access, AuthorizationPolicy, RouteRule};
pub use roles::Role;
pub use verifier::TokenVerifier;
