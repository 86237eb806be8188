// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cadenza serve` command implementation.
//!
//! Wires the yt-dlp resolver, songbird sinks and the Discord surface into a
//! [`SessionRegistry`], then runs the serenity client until a shutdown
//! signal arrives. On shutdown every playback session is torn down before
//! the shards are closed.

use std::sync::Arc;
use std::time::Duration;

use serenity::Client;
use serenity::all::Http;
use songbird::{SerenityInit, Songbird};
use tracing::{info, warn};

use cadenza_config::CadenzaConfig;
use cadenza_core::CadenzaError;
use cadenza_discord::{ChannelAllowList, DiscordSurface, Handler, SongbirdSinks, intents};
use cadenza_player::{SessionRegistry, SessionSettings, drain_sessions, install_signal_handler};
use cadenza_ytdlp::YtDlpResolver;

/// Upper bound on how long shutdown waits for sessions to tear down.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the `cadenza serve` command.
pub async fn run_serve(config: CadenzaConfig) -> Result<(), CadenzaError> {
    init_tracing(&config.bot.log_level);

    let token = config
        .discord
        .token
        .clone()
        .ok_or_else(|| CadenzaError::Config("discord.token is required to serve".to_string()))?;

    info!(name = %config.bot.name, "starting cadenza serve");

    let allowlist = Arc::new(ChannelAllowList::load(&config.channels.allowlist_path).await?);

    let manager = Songbird::serenity();
    let sinks = Arc::new(SongbirdSinks::new(
        Arc::clone(&manager),
        config.playback.volume,
    ));
    let surface = Arc::new(DiscordSurface::new(
        Arc::new(Http::new(&token)),
        config.playback.embed_color,
    ));
    let resolver = Arc::new(YtDlpResolver::new(config.resolver.clone()));

    let registry = Arc::new(SessionRegistry::new(
        resolver,
        sinks.clone(),
        surface,
        SessionSettings::from(&config.playback),
    ));

    let cancel = install_signal_handler();

    let handler = Handler::new(
        Arc::clone(&registry),
        sinks,
        allowlist,
        &config,
        cancel.clone(),
    );

    let mut client = Client::builder(&token, intents())
        .event_handler(handler)
        .register_songbird_with(manager)
        .await
        .map_err(|e| CadenzaError::Channel {
            message: "failed to build Discord client".to_string(),
            source: Some(Box::new(e)),
        })?;

    let shard_manager = Arc::clone(&client.shard_manager);
    let shutdown_registry = Arc::clone(&registry);
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_cancel.cancelled().await;
        if !drain_sessions(&shutdown_registry, DRAIN_TIMEOUT).await {
            warn!("closing shards with sessions still active");
        }
        shard_manager.shutdown_all().await;
    });

    let result = client.start_autosharded().await;
    // A gateway failure also has to stop the signal task and presence loop.
    cancel.cancel();

    result.map_err(|e| CadenzaError::Channel {
        message: "Discord client stopped with an error".to_string(),
        source: Some(Box::new(e)),
    })?;

    info!("cadenza serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with `RUST_LOG` taking precedence.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cadenza={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
