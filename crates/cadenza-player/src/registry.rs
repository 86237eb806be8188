// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide map from guild to playback session.
//!
//! Sessions are created on first request and removed once torn down by
//! stop, leave, auto-leave or shutdown. Entries are only ever removed when
//! the stored session is the retired one (`Arc::ptr_eq`), so a fresh session
//! created after a teardown is never evicted by a stale caller.
//!
//! Only teardown deregisters. A session whose queue drains stays in the map
//! as an idle entry and is reused by the guild's next request, so the map
//! holds at most one entry per guild that has ever queued something.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use tracing::{debug, info};

use cadenza_core::{
    CadenzaError, ChannelId, GuildId, MediaResolver, NowPlaying, NowPlayingSurface,
    PlaybackState, Request, SinkProvider,
};

use crate::session::{Enqueued, PlaybackSession, SessionSettings, TeardownReason};

/// Owns every live [`PlaybackSession`] and the collaborators used to build them.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<PlaybackSession>>,
    resolver: Arc<dyn MediaResolver>,
    sinks: Arc<dyn SinkProvider>,
    surface: Arc<dyn NowPlayingSurface>,
    settings: SessionSettings,
}

impl SessionRegistry {
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        sinks: Arc<dyn SinkProvider>,
        surface: Arc<dyn NowPlayingSurface>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            resolver,
            sinks,
            surface,
            settings,
        }
    }

    /// Returns the guild's session, creating an empty one if needed.
    ///
    /// Concurrent callers for the same guild all receive the same session.
    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<PlaybackSession> {
        let entry = self.sessions.entry(guild_id).or_insert_with(|| {
            debug!(%guild_id, "creating playback session");
            Arc::new(PlaybackSession::new(
                guild_id,
                Arc::clone(&self.resolver),
                self.sinks.sink_for(guild_id),
                Arc::clone(&self.surface),
                self.settings.clone(),
            ))
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Queues a request for the guild, starting playback if idle.
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        request: Request,
    ) -> Result<Enqueued, CadenzaError> {
        loop {
            let session = self.get_or_create(guild_id);
            match session.enqueue(request.clone()).await {
                Err(CadenzaError::SessionRetired) => {
                    // Raced a teardown; the entry is dead either way.
                    debug!(%guild_id, "session retired during enqueue, retrying");
                    self.evict(guild_id, &session);
                }
                other => return other,
            }
        }
    }

    /// Stops playback and drops pending requests.
    pub async fn stop(&self, guild_id: GuildId) -> bool {
        self.teardown(guild_id, TeardownReason::Stop).await
    }

    /// Tears the session down and leaves the voice channel.
    ///
    /// Leaving works without a session too, as long as the bot is connected.
    pub async fn leave(&self, guild_id: GuildId) -> bool {
        if self.teardown(guild_id, TeardownReason::Leave).await {
            return true;
        }
        self.disconnect_idle(guild_id).await
    }

    pub async fn skip(&self, guild_id: GuildId) -> bool {
        match self.get(guild_id) {
            Some(session) => session.skip().await,
            None => false,
        }
    }

    pub async fn pause(&self, guild_id: GuildId) -> bool {
        match self.get(guild_id) {
            Some(session) => session.pause().await,
            None => false,
        }
    }

    pub async fn resume(&self, guild_id: GuildId) -> bool {
        match self.get(guild_id) {
            Some(session) => session.resume().await,
            None => false,
        }
    }

    /// See [`PlaybackSession::toggle_pause`].
    pub async fn toggle_pause(&self, guild_id: GuildId) -> Option<bool> {
        match self.get(guild_id) {
            Some(session) => session.toggle_pause().await,
            None => None,
        }
    }

    /// Pending requests for the guild, oldest first.
    pub async fn snapshot_queue(&self, guild_id: GuildId) -> Vec<Request> {
        match self.get(guild_id) {
            Some(session) => session.snapshot().await,
            None => Vec::new(),
        }
    }

    pub async fn state(&self, guild_id: GuildId) -> PlaybackState {
        match self.get(guild_id) {
            Some(session) => session.state().await,
            None => PlaybackState::Idle,
        }
    }

    pub async fn now_playing(&self, guild_id: GuildId) -> Option<NowPlaying> {
        match self.get(guild_id) {
            Some(session) => session.now_playing().await,
            None => None,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of guilds with an item currently on the sink.
    pub async fn playing_count(&self) -> usize {
        let mut playing = 0;
        for session in self.all_sessions() {
            if session.state().await == PlaybackState::Playing {
                playing += 1;
            }
        }
        playing
    }

    /// Reacts to a voice membership change in `channel`.
    ///
    /// When the bot's own channel has no humans left, the guild's session is
    /// torn down and the bot disconnects. Returns `true` if that happened;
    /// repeated notifications for the same departure are no-ops.
    pub async fn on_membership_change(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        remaining_humans: usize,
    ) -> bool {
        if remaining_humans > 0 {
            return false;
        }
        let sink = match self.get(guild_id) {
            Some(session) => Arc::clone(session.sink()),
            None => self.sinks.sink_for(guild_id),
        };
        if sink.current_channel().await != Some(channel_id) {
            return false;
        }

        info!(%guild_id, %channel_id, "voice channel empty, leaving");
        if self.teardown(guild_id, TeardownReason::AutoLeave).await {
            return true;
        }
        self.disconnect_idle(guild_id).await
    }

    /// Tears down every session. Used on process shutdown.
    pub async fn shutdown(&self) -> usize {
        let sessions = self.all_sessions();
        let results = join_all(
            sessions
                .iter()
                .map(|session| session.teardown(TeardownReason::Shutdown)),
        )
        .await;
        for session in &sessions {
            self.evict(session.guild_id(), session);
        }
        let torn_down = results.into_iter().filter(|done| *done).count();
        info!(sessions = torn_down, "all playback sessions torn down");
        torn_down
    }

    async fn teardown(&self, guild_id: GuildId, reason: TeardownReason) -> bool {
        let Some(session) = self.get(guild_id) else {
            return false;
        };
        let torn_down = session.teardown(reason).await;
        self.evict(guild_id, &session);
        torn_down
    }

    async fn disconnect_idle(&self, guild_id: GuildId) -> bool {
        let sink = self.sinks.sink_for(guild_id);
        if !sink.is_connected().await {
            return false;
        }
        match sink.disconnect().await {
            Ok(()) => {
                info!(%guild_id, "left voice channel");
                true
            }
            Err(e) => {
                debug!(%guild_id, error = %e, "failed to leave voice channel");
                false
            }
        }
    }

    fn evict(&self, guild_id: GuildId, session: &Arc<PlaybackSession>) {
        if self
            .sessions
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, session))
            .is_some()
        {
            debug!(%guild_id, "playback session removed");
        }
    }

    // Clones out of the map so no shard lock is held across an await.
    fn all_sessions(&self) -> Vec<Arc<PlaybackSession>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
