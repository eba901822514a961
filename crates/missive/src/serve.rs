// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `missive serve` implementation.
//!
//! Opens the store, wires the messaging service and gateway, and serves
//! until SIGINT or SIGTERM. On the way out the WAL is checkpointed so the
//! database file is self-contained.

use std::sync::Arc;
use std::time::Duration;

use missive_config::MissiveConfig;
use missive_core::{FileUsageNotifier, MessageStore, MissiveError, PluginAdapter};
use missive_gateway::{
    build_router, start_server, GatewayState, HttpFileUsageNotifier, LoggingFileUsageNotifier,
    MessagingService, ServerConfig, ServiceLimits, StaticAuthenticator,
};
use missive_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs the server until a shutdown signal arrives.
pub async fn run_serve(config: MissiveConfig) -> Result<(), MissiveError> {
    init_tracing(&config.service.log_level);

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let notifier = build_notifier(&config)?;
    info!(notifier = notifier.name(), "file usage notifier ready");

    let service = MessagingService::new(storage.clone(), notifier, service_limits(&config));
    let authenticator = Arc::new(StaticAuthenticator::new(config.auth.tokens.clone()));
    if config.auth.tokens.is_empty() {
        warn!("no session keys configured -- every API request will be rejected");
    }

    let app = build_router(GatewayState::new(service), authenticator);
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    let cancel = install_signal_handler();
    let served = start_server(&server_config, app, cancel.cancelled_owned()).await;

    // Close the store even when the server failed.
    let closed = storage.shutdown().await;
    served?;
    closed?;
    info!("missive serve shutdown complete");
    Ok(())
}

/// Request limits derived from the `[sync]` and `[files]` sections.
pub fn service_limits(config: &MissiveConfig) -> ServiceLimits {
    ServiceLimits {
        default_sync_limit: config.sync.default_limit,
        max_sync_limit: config.sync.max_limit,
        file_id_length: config.files.file_id_length,
    }
}

/// HTTP notifier when a usage endpoint is configured, logging notifier otherwise.
pub fn build_notifier(config: &MissiveConfig) -> Result<Arc<dyn FileUsageNotifier>, MissiveError> {
    Ok(match &config.files.usage_endpoint {
        Some(endpoint) => Arc::new(HttpFileUsageNotifier::new(
            endpoint.clone(),
            Duration::from_secs(config.files.timeout_secs),
        )?),
        None => Arc::new(LoggingFileUsageNotifier),
    })
}

/// One-paragraph description of the effective configuration.
pub fn summarize(config: &MissiveConfig) -> String {
    format!(
        "missive: config OK\n  \
         database: {} (wal={})\n  \
         gateway: {}:{}\n  \
         sync limit: default {}, max {}\n  \
         file usage: {}\n  \
         session keys: {}",
        config.storage.database_path,
        config.storage.wal_mode,
        config.gateway.host,
        config.gateway.port,
        config.sync.default_limit,
        config.sync.max_limit,
        config.files.usage_endpoint.as_deref().unwrap_or("log only"),
        config.auth.tokens.len(),
    )
}

/// Cancels the returned token on SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("missive={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
