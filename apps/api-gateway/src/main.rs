// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

use std::{env, net::SocketAddr, sync::Arc};

use fishpath_api_gateway::{
    config::GatewayConfig,
    proxy::Upstreams,
    routes::{app, route_policy},
    state::GatewayState,
};
use fishpath_auth::{SigningKey, TokenVerifier};

#[tokio::main]
async fn main() {
    init_tracing();

    // A missing or weak shared secret must abort startup: a gateway that
    // cannot verify tokens must not route traffic.
    let config = GatewayConfig::from_env().expect("invalid configuration");
    let key = Arc::new(
        SigningKey::from_base64_secret(&config.jwt_secret).expect("invalid JWT_SECRET"),
    );

    let state = GatewayState::new(Upstreams::new(
        config.auth_service_url.clone(),
        config.biodata_service_url.clone(),
        config.treatment_service_url.clone(),
    ));
    let router = app(state, TokenVerifier::new(key), route_policy());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("failed to parse bind address");

    tracing::info!(
        auth = %config.auth_service_url,
        biodata = %config.biodata_service_url,
        treatment = %config.treatment_service_url,
        "api gateway listening on http://{addr}"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, router)
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
