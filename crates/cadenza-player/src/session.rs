// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-guild playback session and its consumer task.
//!
//! A session moves through `Idle -> Resolving -> Playing -> ... -> Idle`, with
//! `Terminating` covering an explicit teardown. All mutable state sits behind
//! one async lock, so "push a request and spawn a consumer if none is
//! running" is a single atomic step and at most one consumer task exists per
//! session at any instant.
//!
//! The consumer task holds its own [`CancellationToken`]. Every await on the
//! consumer side that can take unbounded time (lock acquisition, resolution,
//! completion polling) races that token, so teardown can cancel the consumer
//! and wait for it to finish before touching the sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cadenza_config::PlaybackConfig;
use cadenza_core::{
    CadenzaError, GuildId, MediaResolver, NowPlaying, NowPlayingSurface, PlaybackState, Request,
    Sink,
};
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::projection::NowPlayingSlot;
use crate::queue::GuildQueue;

/// Knobs a session reads from `[playback]`.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// How often the consumer checks whether the sink is still active.
    pub poll_interval: Duration,
    /// Send a notice to the requester's channel when an item cannot be played.
    pub notify_failures: bool,
    /// Whether an explicit stop also leaves the voice channel.
    pub disconnect_on_stop: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for SessionSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            notify_failures: config.notify_failures,
            disconnect_on_stop: config.disconnect_on_stop,
        }
    }
}

/// Why a session is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TeardownReason {
    /// A user asked playback to stop.
    Stop,
    /// A user asked the bot to leave the voice channel.
    Leave,
    /// The last human left the bot's voice channel.
    AutoLeave,
    /// The process is shutting down.
    Shutdown,
}

impl TeardownReason {
    fn disconnects(self, settings: &SessionSettings) -> bool {
        match self {
            TeardownReason::Stop => settings.disconnect_on_stop,
            TeardownReason::Leave | TeardownReason::AutoLeave | TeardownReason::Shutdown => true,
        }
    }
}

/// Outcome of a successful [`PlaybackSession::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    /// 1-based position among pending requests.
    pub position: usize,
    /// Whether this call started the consumer task.
    pub started_consumer: bool,
}

struct Consumer {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct SessionInner {
    queue: GuildQueue,
    consumer: Option<Consumer>,
    state: PlaybackState,
    retired: bool,
}

enum Served {
    Next,
    Cancelled,
    Abandon,
}

/// Playback state of one guild: queue, consumer task and now-playing view.
pub struct PlaybackSession {
    guild_id: GuildId,
    inner: Mutex<SessionInner>,
    now_playing: NowPlayingSlot,
    resolver: Arc<dyn MediaResolver>,
    sink: Arc<dyn Sink>,
    surface: Arc<dyn NowPlayingSurface>,
    settings: SessionSettings,
    consumers_spawned: AtomicU64,
}

impl PlaybackSession {
    pub fn new(
        guild_id: GuildId,
        resolver: Arc<dyn MediaResolver>,
        sink: Arc<dyn Sink>,
        surface: Arc<dyn NowPlayingSurface>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            guild_id,
            inner: Mutex::new(SessionInner {
                queue: GuildQueue::new(),
                consumer: None,
                state: PlaybackState::Idle,
                retired: false,
            }),
            now_playing: NowPlayingSlot::new(Arc::clone(&surface)),
            resolver,
            sink,
            surface,
            settings,
            consumers_spawned: AtomicU64::new(0),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Appends `request` and starts the consumer task if none is running.
    ///
    /// Fails with [`CadenzaError::SessionRetired`] once the session has been
    /// torn down; the caller must go through a fresh session.
    pub async fn enqueue(self: &Arc<Self>, request: Request) -> Result<Enqueued, CadenzaError> {
        let mut inner = self.inner.lock().await;
        if inner.retired {
            return Err(CadenzaError::SessionRetired);
        }

        debug!(guild_id = %self.guild_id, query = %request.query, "request enqueued");
        let position = inner.queue.enqueue(request);

        let started_consumer = inner.consumer.is_none();
        if started_consumer {
            let id = self.consumers_spawned.fetch_add(1, Ordering::SeqCst) + 1;
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(Arc::clone(self).run_consumer(id, cancel.clone()));
            inner.consumer = Some(Consumer { id, cancel, handle });
            inner.state = PlaybackState::Resolving;
        }

        Ok(Enqueued {
            position,
            started_consumer,
        })
    }

    /// Tears the session down: drops pending requests, cancels and awaits the
    /// consumer, deletes the now-playing view and stops the sink.
    ///
    /// Returns `false` if the session had already been torn down.
    pub async fn teardown(&self, reason: TeardownReason) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.retired {
            return false;
        }
        inner.retired = true;
        inner.state = PlaybackState::Terminating;
        let dropped = inner.queue.clear();

        if let Some(consumer) = inner.consumer.take() {
            consumer.cancel.cancel();
            if let Err(e) = consumer.handle.await {
                if e.is_panic() {
                    error!(guild_id = %self.guild_id, consumer_id = consumer.id, "consumer task panicked");
                }
            }
        }

        self.now_playing.retire().await;
        if let Err(e) = self.sink.stop().await {
            debug!(guild_id = %self.guild_id, error = %e, "sink stop failed during teardown");
        }
        if reason.disconnects(&self.settings) {
            if let Err(e) = self.sink.disconnect().await {
                warn!(guild_id = %self.guild_id, error = %e, "failed to leave voice channel");
            }
        }

        inner.state = PlaybackState::Idle;
        info!(guild_id = %self.guild_id, %reason, dropped, "playback session torn down");
        true
    }

    /// Stops the current item so the consumer advances. No-op unless `Playing`.
    pub async fn skip(&self) -> bool {
        let inner = self.inner.lock().await;
        if inner.state != PlaybackState::Playing {
            return false;
        }
        match self.sink.stop().await {
            Ok(()) => {
                debug!(guild_id = %self.guild_id, "skipped current item");
                true
            }
            Err(e) => {
                warn!(guild_id = %self.guild_id, error = %e, "skip failed");
                false
            }
        }
    }

    pub async fn pause(&self) -> bool {
        let inner = self.inner.lock().await;
        if inner.state != PlaybackState::Playing || self.sink.is_paused().await {
            return false;
        }
        self.sink_call("pause", self.sink.pause()).await
    }

    pub async fn resume(&self) -> bool {
        let inner = self.inner.lock().await;
        if inner.state != PlaybackState::Playing || !self.sink.is_paused().await {
            return false;
        }
        self.sink_call("resume", self.sink.resume()).await
    }

    /// Pauses a playing item or resumes a paused one.
    ///
    /// Returns `Some(true)` when the item is now paused, `Some(false)` when it
    /// is now playing, and `None` when nothing was playing.
    pub async fn toggle_pause(&self) -> Option<bool> {
        let inner = self.inner.lock().await;
        if inner.state != PlaybackState::Playing {
            return None;
        }
        if self.sink.is_paused().await {
            self.sink_call("resume", self.sink.resume())
                .await
                .then_some(false)
        } else {
            self.sink_call("pause", self.sink.pause())
                .await
                .then_some(true)
        }
    }

    pub async fn state(&self) -> PlaybackState {
        self.inner.lock().await.state
    }

    /// Ordered copy of the pending requests. Excludes the item being played.
    pub async fn snapshot(&self) -> Vec<Request> {
        self.inner.lock().await.queue.snapshot()
    }

    pub async fn now_playing(&self) -> Option<NowPlaying> {
        self.now_playing.current().await
    }

    pub async fn is_consumer_running(&self) -> bool {
        self.inner.lock().await.consumer.is_some()
    }

    pub async fn is_retired(&self) -> bool {
        self.inner.lock().await.retired
    }

    /// Number of consumer tasks this session has started over its lifetime.
    pub fn consumers_spawned(&self) -> u64 {
        self.consumers_spawned.load(Ordering::SeqCst)
    }

    async fn sink_call<F>(&self, action: &'static str, call: F) -> bool
    where
        F: std::future::Future<Output = Result<(), CadenzaError>>,
    {
        match call.await {
            Ok(()) => {
                debug!(guild_id = %self.guild_id, action, "sink control applied");
                true
            }
            Err(e) => {
                warn!(guild_id = %self.guild_id, action, error = %e, "sink control failed");
                false
            }
        }
    }

    async fn run_consumer(self: Arc<Self>, id: u64, cancel: CancellationToken) {
        debug!(guild_id = %self.guild_id, consumer_id = id, "consumer started");
        while let Some(request) = self.next_request(id, &cancel).await {
            match self.serve(request, &cancel).await {
                Served::Next => {}
                Served::Cancelled => break,
                Served::Abandon => {
                    self.abandon(id, &cancel).await;
                    break;
                }
            }
        }
        debug!(guild_id = %self.guild_id, consumer_id = id, "consumer exited");
    }

    async fn lock_unless_cancelled(
        &self,
        cancel: &CancellationToken,
    ) -> Option<MutexGuard<'_, SessionInner>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            guard = self.inner.lock() => Some(guard),
        }
    }

    /// Pops the next request, or releases the consumer slot when the queue is
    /// empty. Both happen under the lock so a concurrent producer either sees
    /// this consumer or starts a new one.
    async fn next_request(&self, id: u64, cancel: &CancellationToken) -> Option<Request> {
        let mut inner = self.lock_unless_cancelled(cancel).await?;
        if inner.retired {
            return None;
        }
        match inner.queue.dequeue_front() {
            Some(request) => {
                inner.state = PlaybackState::Resolving;
                Some(request)
            }
            None => {
                self.release(&mut inner, id).await;
                debug!(guild_id = %self.guild_id, consumer_id = id, "queue drained");
                None
            }
        }
    }

    async fn serve(&self, request: Request, cancel: &CancellationToken) -> Served {
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Served::Cancelled,
            connected = self.sink.is_connected() => connected,
        };
        if !connected {
            warn!(guild_id = %self.guild_id, query = %request.query, "sink not connected, abandoning session");
            return Served::Abandon;
        }

        let resolved = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Served::Cancelled,
            resolved = self.resolver.resolve(&request.query) => resolved,
        };
        let item = match resolved {
            Ok(item) => item,
            Err(e) => {
                warn!(guild_id = %self.guild_id, query = %request.query, error = %e, "resolution failed, skipping request");
                self.report_failure(&request, &e).await;
                return Served::Next;
            }
        };

        if cancel.is_cancelled() {
            return Served::Cancelled;
        }
        self.now_playing
            .publish(NowPlaying::new(item.clone(), &request))
            .await;
        if cancel.is_cancelled() {
            return Served::Cancelled;
        }

        if let Err(e) = self.sink.start(&item).await {
            self.now_playing.retire().await;
            if e.is_structural() {
                warn!(guild_id = %self.guild_id, error = %e, "sink unavailable, abandoning session");
                return Served::Abandon;
            }
            warn!(guild_id = %self.guild_id, title = %item.title, error = %e, "sink rejected item, skipping");
            self.report_failure(&request, &e).await;
            return Served::Next;
        }

        match self.lock_unless_cancelled(cancel).await {
            Some(mut inner) => inner.state = PlaybackState::Playing,
            None => return Served::Cancelled,
        }
        info!(guild_id = %self.guild_id, title = %item.title, requester = %request.requester.display_name, "now playing");

        if !self.await_completion(cancel).await {
            return Served::Cancelled;
        }
        self.now_playing.retire().await;
        debug!(guild_id = %self.guild_id, title = %item.title, "item finished");
        Served::Next
    }

    /// Polls the sink until it goes inactive. Returns `false` if cancelled first.
    async fn await_completion(&self, cancel: &CancellationToken) -> bool {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
            if !self.sink.is_active().await {
                return true;
            }
        }
    }

    async fn abandon(&self, id: u64, cancel: &CancellationToken) {
        let Some(mut inner) = self.lock_unless_cancelled(cancel).await else {
            return;
        };
        let dropped = inner.queue.clear();
        self.release(&mut inner, id).await;
        warn!(guild_id = %self.guild_id, dropped, "dropped pending requests");
    }

    async fn release(&self, inner: &mut SessionInner, id: u64) {
        if inner.consumer.as_ref().is_some_and(|c| c.id == id) {
            inner.consumer = None;
        }
        inner.state = PlaybackState::Idle;
        self.now_playing.retire().await;
    }

    async fn report_failure(&self, request: &Request, err: &CadenzaError) {
        if !self.settings.notify_failures {
            return;
        }
        let text = format!("Could not play `{}`: {err}", request.query);
        if let Err(e) = self.surface.notify(request.reply_target, &text).await {
            debug!(guild_id = %self.guild_id, error = %e, "failed to send failure notice");
        }
    }
}
