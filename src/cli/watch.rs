//! Watch command implementation

use crate::api::{ApiClient, ApiError};
use crate::cache::OfficeCache;
use crate::cli::output::{format_notice_json, format_notice_line, format_state_line};
use crate::cli::{ServerArgs, WatchArgs};
use crate::config::{DeskRelayConfig, LogFormat};
use crate::notice::NoticeQueue;
use crate::relay::Relay;
use crate::sync::CacheSync;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServerArgs,
) -> Result<DeskRelayConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        DeskRelayConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        DeskRelayConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(ref api_url) = args.api_url {
        config.server.api_url = api_url.clone();
    }
    if let Some(ref ws_url) = args.ws_url {
        config.server.ws_url = ws_url.clone();
    }
    if let Some(ref token) = args.token {
        config.server.token = Some(token.clone());
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Logs go to stderr so stdout stays clean for notices
    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Build an authenticated REST client from configuration.
pub fn build_api_client(config: &DeskRelayConfig) -> Result<ApiClient, Box<dyn std::error::Error>> {
    let token = config
        .server
        .token
        .clone()
        .ok_or("No session token. Pass --token or set DESKRELAY_TOKEN.")?;

    Ok(ApiClient::new(&config.server.api_url, config.server.request_timeout())?
        .with_credential(token))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let mut config = load_config_with_overrides(&args.server)?;
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_refresh {
        config.refresh.enabled = false;
    }
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;
    tracing::info!(ws_url = %config.server.ws_url, "Starting deskrelay watch");

    // 3. Who am I? Own updates must not raise notices.
    let api = build_api_client(&config)?;
    let identity = match api.me().await {
        Ok(user) => {
            tracing::info!(username = %user.username, "Signed in");
            Some(user.username)
        }
        Err(e @ ApiError::Unauthorized(_)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Could not load profile, all updates will raise notices");
            None
        }
    };

    // 4. Seed the cache
    let cache = Arc::new(OfficeCache::new());
    let sync = CacheSync::new(api.clone(), Arc::clone(&cache), config.refresh.clone());
    match sync.refresh_once().await {
        Ok(report) => tracing::info!(
            desks = report.desks,
            reservations = ?report.reservations,
            "Office cache loaded"
        ),
        Err(e) => tracing::warn!(error = %e, "Initial cache load failed, starting empty"),
    }

    // 5. Start the relay
    let notices = Arc::new(NoticeQueue::with_settings(
        config.notices.capacity,
        config.notices.default_duration(),
    ));
    let (relay, relay_task) = Relay::spawn(
        config.server.ws_url.clone(),
        config.relay.clone(),
        Arc::clone(&cache),
        Arc::clone(&notices),
    );
    relay.set_identity(identity);
    if let Some(token) = config.server.token.clone() {
        relay.connect(token);
    }

    // 6. Periodic REST reconciliation
    let cancel_token = CancellationToken::new();
    let sync_handle = if config.refresh.enabled {
        Some(sync.start(cancel_token.clone()))
    } else {
        tracing::info!("Periodic refresh disabled");
        None
    };

    // 7. Print notices and connection changes until shutdown
    let printer = tokio::spawn(print_updates(
        relay.clone(),
        Arc::clone(&notices),
        args.json,
        cancel_token.clone(),
    ));

    shutdown_signal(cancel_token.clone()).await;

    relay.shutdown();
    if let Err(e) = relay_task.await {
        tracing::warn!(error = %e, "Relay task ended abnormally");
    }
    if let Some(handle) = sync_handle {
        let _ = handle.await;
    }
    let _ = printer.await;

    tracing::info!("deskrelay stopped");
    Ok(())
}

async fn print_updates(
    relay: Relay,
    notices: Arc<NoticeQueue>,
    json: bool,
    cancel_token: CancellationToken,
) {
    let mut notice_rx = notices.subscribe();
    let mut state_rx = relay.subscribe();
    let mut last_state = state_rx.borrow().state;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            received = notice_rx.recv() => match received {
                Ok(notice) => {
                    let line = if json {
                        format_notice_json(&notice)
                    } else {
                        format_notice_line(&notice)
                    };
                    println!("{}", line);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notice printer fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state_rx.borrow_and_update().clone();
                if snapshot.state != last_state {
                    last_state = snapshot.state;
                    if !json {
                        eprintln!("{}", format_state_line(&snapshot));
                    }
                }
            }
        }
    }
}
