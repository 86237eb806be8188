// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Songbird-backed audio sinks.
//!
//! One [`SongbirdSink`] exists per guild and wraps that guild's songbird
//! `Call`. Audio is streamed over HTTP from the resolved stream URL and
//! decoded by symphonia inside the songbird driver.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use songbird::Songbird;
use songbird::input::{HttpRequest, Input};
use songbird::tracks::{PlayMode, TrackHandle};
use tokio::sync::Mutex;
use tracing::{debug, info};

use cadenza_core::{CadenzaError, ChannelId, GuildId, Item, Sink, SinkProvider};

use crate::ids;

/// Audio output for one guild's voice connection.
pub struct SongbirdSink {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    http_client: reqwest::Client,
    volume: f32,
    track: Mutex<Option<TrackHandle>>,
}

impl SongbirdSink {
    fn new(
        guild_id: GuildId,
        manager: Arc<Songbird>,
        http_client: reqwest::Client,
        volume: f32,
    ) -> Self {
        Self {
            guild_id,
            manager,
            http_client,
            volume,
            track: Mutex::new(None),
        }
    }

    async fn mode(&self) -> Option<PlayMode> {
        let track = self.track.lock().await.clone()?;
        track.get_info().await.ok().map(|state| state.playing)
    }

    async fn with_track(
        &self,
        action: &str,
        apply: impl FnOnce(&TrackHandle) -> songbird::tracks::TrackResult<()>,
    ) -> Result<(), CadenzaError> {
        let track = self.track.lock().await;
        let Some(track) = track.as_ref() else {
            return Ok(());
        };
        apply(track).map_err(|e| CadenzaError::SinkRejected {
            message: format!("{action} failed: {e}"),
        })
    }
}

#[async_trait]
impl Sink for SongbirdSink {
    async fn start(&self, item: &Item) -> Result<(), CadenzaError> {
        let call = self
            .manager
            .get(ids::to_serenity_guild(self.guild_id))
            .ok_or(CadenzaError::SinkNotConnected)?;
        let mut handler = call.lock().await;
        if handler.current_connection().is_none() {
            return Err(CadenzaError::SinkNotConnected);
        }

        let input: Input =
            HttpRequest::new(self.http_client.clone(), item.stream_url.clone()).into();
        let track = handler.play_only_input(input);
        track
            .set_volume(self.volume)
            .map_err(|e| CadenzaError::SinkRejected {
                message: format!("failed to set volume: {e}"),
            })?;

        debug!(guild_id = %self.guild_id, title = %item.title, "track started");
        *self.track.lock().await = Some(track);
        Ok(())
    }

    async fn pause(&self) -> Result<(), CadenzaError> {
        self.with_track("pause", |t| t.pause()).await
    }

    async fn resume(&self) -> Result<(), CadenzaError> {
        self.with_track("resume", |t| t.play()).await
    }

    async fn stop(&self) -> Result<(), CadenzaError> {
        let Some(track) = self.track.lock().await.take() else {
            return Ok(());
        };
        // A track that already ended reports an error here.
        if let Err(e) = track.stop() {
            debug!(guild_id = %self.guild_id, error = %e, "track already finished");
        }
        Ok(())
    }

    async fn is_active(&self) -> bool {
        matches!(self.mode().await, Some(PlayMode::Play | PlayMode::Pause))
    }

    async fn is_paused(&self) -> bool {
        matches!(self.mode().await, Some(PlayMode::Pause))
    }

    async fn is_connected(&self) -> bool {
        match self.manager.get(ids::to_serenity_guild(self.guild_id)) {
            Some(call) => call.lock().await.current_connection().is_some(),
            None => false,
        }
    }

    async fn current_channel(&self) -> Option<ChannelId> {
        let call = self.manager.get(ids::to_serenity_guild(self.guild_id))?;
        let channel = call.lock().await.current_channel()?;
        Some(ChannelId(channel.0.get()))
    }

    async fn disconnect(&self) -> Result<(), CadenzaError> {
        self.track.lock().await.take();
        match self
            .manager
            .remove(ids::to_serenity_guild(self.guild_id))
            .await
        {
            Ok(()) | Err(songbird::error::JoinError::NoCall) => {
                info!(guild_id = %self.guild_id, "left voice channel");
                Ok(())
            }
            Err(e) => Err(CadenzaError::Channel {
                message: format!("failed to leave voice channel: {e}"),
                source: None,
            }),
        }
    }
}

/// Hands out per-guild [`SongbirdSink`]s and joins voice channels.
pub struct SongbirdSinks {
    manager: Arc<Songbird>,
    http_client: reqwest::Client,
    volume: f32,
    sinks: DashMap<GuildId, Arc<SongbirdSink>>,
}

impl SongbirdSinks {
    pub fn new(manager: Arc<Songbird>, volume: f32) -> Self {
        Self {
            manager,
            http_client: reqwest::Client::new(),
            volume,
            sinks: DashMap::new(),
        }
    }

    fn sink(&self, guild_id: GuildId) -> Arc<SongbirdSink> {
        let entry = self.sinks.entry(guild_id).or_insert_with(|| {
            Arc::new(SongbirdSink::new(
                guild_id,
                Arc::clone(&self.manager),
                self.http_client.clone(),
                self.volume,
            ))
        });
        Arc::clone(entry.value())
    }

    /// Connects to `channel` unless already connected somewhere in the guild.
    pub async fn ensure_joined(
        &self,
        guild_id: GuildId,
        channel: ChannelId,
    ) -> Result<(), CadenzaError> {
        if self.sink(guild_id).is_connected().await {
            return Ok(());
        }
        self.manager
            .join(
                ids::to_serenity_guild(guild_id),
                ids::to_serenity_channel(channel),
            )
            .await
            .map_err(|e| CadenzaError::Channel {
                message: format!("failed to join voice channel: {e}"),
                source: None,
            })?;
        info!(%guild_id, %channel, "joined voice channel");
        Ok(())
    }
}

impl SinkProvider for SongbirdSinks {
    fn sink_for(&self, guild_id: GuildId) -> Arc<dyn Sink> {
        self.sink(guild_id)
    }
}
