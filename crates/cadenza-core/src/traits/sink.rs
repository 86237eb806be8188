// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio sink trait: the per-guild output endpoint bound to a voice connection.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CadenzaError;
use crate::types::{ChannelId, GuildId, Item};

/// An audio output handle bound to one guild.
///
/// A sink emits no events. The scheduler polls [`Sink::is_active`] to learn
/// that an item has finished.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Starts presenting `item`, replacing whatever was playing.
    ///
    /// Fails with [`CadenzaError::SinkNotConnected`] when there is no voice
    /// connection and [`CadenzaError::SinkRejected`] when this item alone
    /// could not be started.
    async fn start(&self, item: &Item) -> Result<(), CadenzaError>;

    /// Pauses the current item.
    async fn pause(&self) -> Result<(), CadenzaError>;

    /// Resumes a paused item.
    async fn resume(&self) -> Result<(), CadenzaError>;

    /// Stops the current item. Observably identical to natural completion.
    async fn stop(&self) -> Result<(), CadenzaError>;

    /// Returns `true` while an item is playing or paused.
    async fn is_active(&self) -> bool;

    /// Returns `true` while the current item is paused.
    async fn is_paused(&self) -> bool;

    /// Returns `true` when the sink holds a live voice connection.
    async fn is_connected(&self) -> bool;

    /// Voice channel the sink is connected to, if any.
    async fn current_channel(&self) -> Option<ChannelId>;

    /// Leaves the voice channel. Disconnecting an idle sink is not an error.
    async fn disconnect(&self) -> Result<(), CadenzaError>;
}

/// Hands out the sink for a guild. Owned by whatever manages voice connections.
pub trait SinkProvider: Send + Sync + 'static {
    fn sink_for(&self, guild_id: GuildId) -> Arc<dyn Sink>;
}
