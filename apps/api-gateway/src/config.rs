// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. The gateway
//! must be configured with the same base64-encoded secret as the
//! authentication service: that shared secret is the entire trust
//! boundary between the two deployments.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | Base64-encoded HMAC secret shared with the auth service | Required |
//! | `AUTH_SERVICE_URL` | Base URL of the authentication service | `http://localhost:8081` |
//! | `BIODATA_SERVICE_URL` | Base URL of the biodata service | `http://localhost:8082` |
//! | `TREATMENT_SERVICE_URL` | Base URL of the treatment service | `http://localhost:8083` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;

use fishpath_auth::AuthError;
use url::Url;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Base64-encoded HMAC secret; must match the issuing service.
    pub jwt_secret: String,
    pub auth_service_url: Url,
    pub biodata_service_url: Url,
    pub treatment_service_url: Url,
}

fn upstream_url(var: &str, default: &str) -> Result<Url, AuthError> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| AuthError::Configuration(format!("{var} is not a URL: {e}")))
}

impl GatewayConfig {
    /// Load the configuration from the environment.
    ///
    /// # Errors
    /// [`AuthError::Configuration`] on a missing secret or an unparseable
    /// upstream URL; both are fatal at startup.
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AuthError::Configuration("JWT_SECRET is not set".to_string()))?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret,
            auth_service_url: upstream_url("AUTH_SERVICE_URL", "http://localhost:8081")?,
            biodata_service_url: upstream_url("BIODATA_SERVICE_URL", "http://localhost:8082")?,
            treatment_service_url: upstream_url("TREATMENT_SERVICE_URL", "http://localhost:8083")?,
        })
    }
}
