mod app;
mod config;
mod error;
mod handlers;
mod load_balancer;
mod metrics;
mod middleware;
mod models;
mod rate_limit;
mod renderer;
mod state;
mod validate;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::load_balancer::{LoadBalancer, health_checker};
use crate::rate_limit::{RateLimiter, sweeper};
use crate::renderer::HttpRenderer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // no request timeout: a slow render is the caller's wait
    let client = reqwest::Client::new();
    let load_balancer = Arc::new(LoadBalancer::new(&args.backends)?);
    let rate_limiter = Arc::new(RateLimiter::new(
        args.rate_limit,
        Duration::from_secs(args.rate_window),
    ));

    let state = Arc::new(AppState {
        renderer: Arc::new(HttpRenderer::new(client.clone(), load_balancer.clone())),
        rate_limiter: rate_limiter.clone(),
        trusted_ip_header: args.trusted_ip_header.clone(),
    });

    tokio::spawn(health_checker(
        load_balancer,
        client,
        Duration::from_secs(args.health_interval),
        args.health_path.clone(),
    ));
    tokio::spawn(sweeper(rate_limiter, Duration::from_secs(args.sweep_interval)));

    let app = app::router(state, &args.cors_origins());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(port = args.port, "shot gateway running");
    tracing::info!(
        limit = args.rate_limit,
        window_secs = args.rate_window,
        header = %args.trusted_ip_header,
        "rate limiting per client"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
