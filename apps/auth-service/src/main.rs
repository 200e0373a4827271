// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

use std::{env, net::SocketAddr, sync::Arc};

use fishpath_auth::{SigningKey, TokenIssuer, TokenVerifier};
use fishpath_auth_service::{
    api::router,
    config::ServiceConfig,
    state::AppState,
    store::{InMemoryUserStore, SharedUserStore},
};

#[tokio::main]
async fn main() {
    init_tracing();

    // Configuration problems (missing secret, weak secret, bad TTL) are
    // fatal before the listener binds.
    let config = ServiceConfig::from_env().expect("invalid configuration");
    let key = Arc::new(
        SigningKey::from_base64_secret(&config.jwt_secret).expect("invalid JWT_SECRET"),
    );
    let issuer = TokenIssuer::new(key.clone(), config.token_ttl).expect("invalid TOKEN_TTL_SECS");
    let verifier = TokenVerifier::new(key);

    let mut store = InMemoryUserStore::new();
    store.seed_admin(&config.admin_username, &config.admin_password);
    tracing::info!(username = %config.admin_username, "seeded administrator account");

    let state = AppState::new(issuer, SharedUserStore::new(store));
    let app = router(state, verifier);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("failed to parse bind address");

    tracing::info!("auth service listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
