//! # Statusline
//!
//! A Rust web service that posts status updates and threads to Twitter/X
//! using OAuth 1.0a user-context authentication.
//!
//! ## Environment Variables
//!
//! - `xapi_api_key`, `xapi_api_key_secret`, `xapi_access_token`,
//!   `xapi_access_token_secret`: OAuth 1.0a credentials (required)
//! - `PORT`: Server port (defaults to 3000)
//! - `ORIGIN`: Public base URL; when set the webhook is registered at startup
//! - `STATUS_RATE_LIMIT_MAX`, `STATUS_RATE_LIMIT_PERIOD_SECS`,
//!   `STATUS_CHAIN_POLICY`: Dispatcher settings

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use axum::http::{header, HeaderValue};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use statusline::{
    app_router, get_origin, get_server_port, get_webhook_id_path, register_webhook,
    spawn_status_listener, store_webhook_id, AppState, DispatchConfig, HttpTransport,
    RateLimiter, StatusBus, StatusDispatcher, TwitterConfig,
};

/// Main entry point for the statusline web service.
///
/// Loads configuration, subscribes the status dispatcher to the event
/// channel, registers the webhook when an origin is configured, and serves
/// the HTTP API until terminated.
///
/// # Logging
///
/// Log levels can be controlled via the `RUST_LOG` environment variable.
///
/// # Panics
///
/// This function will panic if the server port cannot be bound.
///
/// Posts still queued when the process is interrupted are dropped.
#[tokio::main]
async fn main() {
    // Initialize the logging system
    env_logger::init();

    let config = match TwitterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load Twitter configuration: {}", e);
            std::process::exit(1);
        }
    };
    let dispatch = DispatchConfig::from_env();

    let transport = match HttpTransport::new(&config) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Failed to create HTTP transport: {}", e);
            std::process::exit(1);
        }
    };

    // One limiter for the whole process: every post shares the same budget
    let limiter = Arc::new(RateLimiter::new(
        dispatch.rate_limit_max,
        dispatch.rate_limit_period,
    ));
    info!(
        "Outbound budget: {} posts per {:?}, chain policy: {}",
        limiter.max_requests(),
        limiter.period(),
        dispatch.chain_policy
    );

    let dispatcher =
        Arc::new(StatusDispatcher::new(transport, limiter).with_policy(dispatch.chain_policy));
    let (bus, receiver) = StatusBus::channel();
    let listener_handle = spawn_status_listener(dispatcher, receiver);

    match get_origin() {
        Some(origin) => {
            let config = config.clone();
            tokio::spawn(async move {
                match register_webhook(&config, &origin).await {
                    Ok(webhook) => {
                        if let Err(e) = store_webhook_id(&get_webhook_id_path(), &webhook) {
                            error!("Failed to store webhook id: {}", e);
                        }
                    }
                    Err(e) => error!("Webhook registration failed: {}", e),
                }
            });
        }
        None => warn!("ORIGIN is not set, skipping webhook registration"),
    }

    // Inbound requests are limited per client IP
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(20)
            .finish()
            .expect("governor configuration is valid"),
    );

    let state = AppState::new(bus, config.credentials.consumer_secret.clone());
    let app = app_router(state)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                )),
        );

    let port = get_server_port();
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    info!("Starting statusline server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    tokio::select! {
        result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        }
        _ = listener_handle => {
            info!("Status listener completed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
        }
    }
}
