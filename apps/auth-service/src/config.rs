// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. A missing or
//! weak signing secret aborts process start before the listener binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8081` |
//! | `JWT_SECRET` | Base64-encoded HMAC secret shared with the gateway | Required |
//! | `TOKEN_TTL_SECS` | Validity window of issued tokens, seconds | `86400` |
//! | `ADMIN_USERNAME` | Seeded administrator account | `admin` |
//! | `ADMIN_PASSWORD` | Seeded administrator password | Required |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;

use chrono::Duration;
use fishpath_auth::AuthError;

/// Default validity window of issued tokens: 24 hours.
const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Base64-encoded HMAC secret; must be identical at every verifier.
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub admin_username: String,
    pub admin_password: String,
}

impl ServiceConfig {
    /// Load the configuration from the environment.
    ///
    /// # Errors
    /// [`AuthError::Configuration`] on a missing secret or admin password,
    /// or an unparseable TTL; all are fatal at startup.
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AuthError::Configuration("JWT_SECRET is not set".to_string()))?;

        let admin_password = env::var("ADMIN_PASSWORD")
            .map_err(|_| AuthError::Configuration("ADMIN_PASSWORD is not set".to_string()))?;

        let token_ttl_secs = match env::var("TOKEN_TTL_SECS") {
            Ok(raw) => raw.parse::<i64>().map_err(|_| {
                AuthError::Configuration(format!("TOKEN_TTL_SECS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            jwt_secret,
            token_ttl: Duration::seconds(token_ttl_secs),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password,
        })
    }
}
