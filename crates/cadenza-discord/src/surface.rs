// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord implementation of the now-playing surface.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::all::{CreateMessage, Http};
use tracing::debug;

use cadenza_core::{
    CadenzaError, ChannelId, MessageId, NowPlaying, NowPlayingSurface, ProjectionHandle,
};

use crate::embed;
use crate::ids;

/// Posts now-playing embeds with playback buttons and deletes them on request.
pub struct DiscordSurface {
    http: Arc<Http>,
    color: u32,
}

impl DiscordSurface {
    pub fn new(http: Arc<Http>, color: u32) -> Self {
        Self { http, color }
    }
}

#[async_trait]
impl NowPlayingSurface for DiscordSurface {
    async fn publish(&self, now_playing: &NowPlaying) -> Result<ProjectionHandle, CadenzaError> {
        let message = CreateMessage::new()
            .embed(embed::now_playing_embed(now_playing, self.color))
            .components(vec![embed::controls()]);

        let sent = ids::to_serenity_channel(now_playing.reply_target)
            .send_message(self.http.as_ref(), message)
            .await
            .map_err(|e| CadenzaError::Surface {
                message: "failed to post now-playing embed".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(ProjectionHandle {
            channel_id: now_playing.reply_target,
            message_id: MessageId(sent.id.get()),
        })
    }

    async fn retire(&self, handle: ProjectionHandle) -> Result<(), CadenzaError> {
        self.http
            .delete_message(
                ids::to_serenity_channel(handle.channel_id),
                ids::to_serenity_message(handle.message_id),
                None,
            )
            .await
            .map_err(|e| CadenzaError::Surface {
                message: "failed to delete now-playing embed".to_string(),
                source: Some(Box::new(e)),
            })
    }

    async fn notify(&self, channel: ChannelId, text: &str) -> Result<(), CadenzaError> {
        send_notice(&self.http, channel, text, None).await
    }
}

/// Sends a plain-text notice, optionally deleting it after `ttl`.
pub async fn send_notice(
    http: &Arc<Http>,
    channel: ChannelId,
    text: &str,
    ttl: Option<Duration>,
) -> Result<(), CadenzaError> {
    let sent = ids::to_serenity_channel(channel)
        .say(http.as_ref(), text)
        .await
        .map_err(|e| CadenzaError::Surface {
            message: "failed to send notice".to_string(),
            source: Some(Box::new(e)),
        })?;

    if let Some(ttl) = ttl {
        let http = Arc::clone(http);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Err(e) = sent.delete(http.as_ref()).await {
                debug!(error = %e, "failed to delete expired notice");
            }
        });
    }
    Ok(())
}
