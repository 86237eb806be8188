// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic bot presence ("🎶 playing music in N servers").

use std::time::Duration;

use serenity::all::{ActivityData, Context};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub fn presence_text(servers: usize) -> String {
    format!("🎶 playing music in {servers} servers")
}

/// Refreshes the activity every `interval` until `shutdown` is cancelled.
pub fn spawn_presence_updates(
    ctx: Context,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let servers = ctx.cache.guild_count();
                    ctx.set_activity(Some(ActivityData::playing(presence_text(servers))));
                    debug!(servers, "presence updated");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_mentions_server_count() {
        assert_eq!(presence_text(3), "🎶 playing music in 3 servers");
    }
}
