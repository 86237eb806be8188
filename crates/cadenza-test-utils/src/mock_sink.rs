// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock audio sink and sink provider for deterministic testing.
//!
//! `MockSink` records every started item and keeps it "active" until the
//! test calls [`MockSink::finish`] (or `stop` is invoked), so completion is
//! driven by the test instead of a clock. A sink built with instant
//! completion reports inactive right after `start`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use tokio::sync::Mutex;

use cadenza_core::{CadenzaError, ChannelId, GuildId, Item, Sink, SinkProvider};

/// Voice channel every mock sink starts connected to.
pub const MOCK_VOICE_CHANNEL: ChannelId = ChannelId(4242);

/// A recording sink with test-controlled completion.
pub struct MockSink {
    connected: AtomicBool,
    channel: Mutex<Option<ChannelId>>,
    active: AtomicBool,
    paused: AtomicBool,
    instant_completion: bool,
    rejected: Mutex<HashSet<String>>,
    started: Mutex<Vec<Item>>,
    stops: AtomicUsize,
    disconnects: AtomicUsize,
}

impl MockSink {
    /// A sink connected to [`MOCK_VOICE_CHANNEL`] whose items play until finished.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            channel: Mutex::new(Some(MOCK_VOICE_CHANNEL)),
            active: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            instant_completion: false,
            rejected: Mutex::new(HashSet::new()),
            started: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }

    /// A sink whose items finish as soon as they start.
    pub fn with_instant_completion() -> Self {
        Self {
            instant_completion: true,
            ..Self::new()
        }
    }

    /// A sink without a voice connection.
    pub async fn disconnected() -> Self {
        let sink = Self::new();
        sink.connected.store(false, Ordering::SeqCst);
        *sink.channel.lock().await = None;
        sink
    }

    /// Ends the current item as if the audio ran out.
    pub fn finish(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Make `start` reject the item with this title.
    pub async fn reject(&self, title: &str) {
        self.rejected.lock().await.insert(title.to_string());
    }

    /// Simulate the voice connection dropping.
    pub async fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
        *self.channel.lock().await = None;
        self.finish();
    }

    /// Titles passed to `start`, in order.
    pub async fn started_titles(&self) -> Vec<String> {
        self.started
            .lock()
            .await
            .iter()
            .map(|item| item.title.clone())
            .collect()
    }

    pub async fn start_count(&self) -> usize {
        self.started.lock().await.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn active_now(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for MockSink {
    async fn start(&self, item: &Item) -> Result<(), CadenzaError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(CadenzaError::SinkNotConnected);
        }
        if self.rejected.lock().await.contains(&item.title) {
            return Err(CadenzaError::SinkRejected {
                message: format!("cannot decode {}", item.title),
            });
        }
        self.started.lock().await.push(item.clone());
        self.paused.store(false, Ordering::SeqCst);
        self.active.store(!self.instant_completion, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<(), CadenzaError> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<(), CadenzaError> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), CadenzaError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.finish();
        Ok(())
    }

    async fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn current_channel(&self) -> Option<ChannelId> {
        *self.channel.lock().await
    }

    async fn disconnect(&self) -> Result<(), CadenzaError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.drop_connection().await;
        Ok(())
    }
}

/// Hands out one [`MockSink`] per guild, creating it on first use.
#[derive(Default)]
pub struct MockSinkProvider {
    sinks: std::sync::Mutex<HashMap<GuildId, Arc<MockSink>>>,
    instant_completion: bool,
}

impl MockSinkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose sinks finish every item immediately.
    pub fn with_instant_completion() -> Self {
        Self {
            instant_completion: true,
            ..Self::default()
        }
    }

    /// The concrete sink for `guild_id`, for assertions and completion control.
    pub fn sink(&self, guild_id: GuildId) -> Arc<MockSink> {
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        let sink = sinks.entry(guild_id).or_insert_with(|| {
            Arc::new(if self.instant_completion {
                MockSink::with_instant_completion()
            } else {
                MockSink::new()
            })
        });
        Arc::clone(sink)
    }
}

impl SinkProvider for MockSinkProvider {
    fn sink_for(&self, guild_id: GuildId) -> Arc<dyn Sink> {
        self.sink(guild_id)
    }
}
