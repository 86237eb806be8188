// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Surface where now-playing views and short notices are published.

use async_trait::async_trait;

use crate::error::CadenzaError;
use crate::types::{ChannelId, NowPlaying, ProjectionHandle};

/// External representation of the now-playing view (a chat message with
/// playback controls, in practice).
#[async_trait]
pub trait NowPlayingSurface: Send + Sync + 'static {
    /// Posts a view of `now_playing` to its reply target.
    async fn publish(&self, now_playing: &NowPlaying) -> Result<ProjectionHandle, CadenzaError>;

    /// Deletes a previously published view.
    async fn retire(&self, handle: ProjectionHandle) -> Result<(), CadenzaError>;

    /// Sends a short plain-text notice to a channel.
    async fn notify(&self, channel: ChannelId, text: &str) -> Result<(), CadenzaError>;
}
