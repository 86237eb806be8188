// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock now-playing surface for deterministic testing.
//!
//! `MockSurface` captures every published view, every retired handle and
//! every notice so tests can assert that no view outlives its item. A gated
//! surface parks each publish until released, so teardown can be raced
//! against a publish in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use cadenza_core::{
    CadenzaError, ChannelId, MessageId, NowPlaying, NowPlayingSurface, ProjectionHandle,
};

/// A recording surface that hands out sequential message ids.
pub struct MockSurface {
    next_id: AtomicU64,
    fail_publish: AtomicBool,
    gate: Option<Arc<Semaphore>>,
    publish_attempts: AtomicUsize,
    published: Mutex<Vec<(ProjectionHandle, NowPlaying)>>,
    retired: Mutex<Vec<ProjectionHandle>>,
    notices: Mutex<Vec<(ChannelId, String)>>,
}

impl MockSurface {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            fail_publish: AtomicBool::new(false),
            gate: None,
            publish_attempts: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            retired: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// A surface whose publishes block until [`release_publishes`](Self::release_publishes).
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    pub fn release_publishes(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Publishes entered so far, including ones still parked on the gate.
    pub fn publish_attempts(&self) -> usize {
        self.publish_attempts.load(Ordering::SeqCst)
    }

    /// Make subsequent publishes fail (e.g. missing permissions).
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Titles of every view published so far.
    pub async fn published_titles(&self) -> Vec<String> {
        self.published
            .lock()
            .await
            .iter()
            .map(|(_, np)| np.item.title.clone())
            .collect()
    }

    pub async fn retired(&self) -> Vec<ProjectionHandle> {
        self.retired.lock().await.clone()
    }

    /// Views that were published and never retired.
    pub async fn live(&self) -> Vec<ProjectionHandle> {
        let retired = self.retired.lock().await.clone();
        self.published
            .lock()
            .await
            .iter()
            .map(|(handle, _)| *handle)
            .filter(|handle| !retired.contains(handle))
            .collect()
    }

    pub async fn notices(&self) -> Vec<(ChannelId, String)> {
        self.notices.lock().await.clone()
    }
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NowPlayingSurface for MockSurface {
    async fn publish(&self, now_playing: &NowPlaying) -> Result<ProjectionHandle, CadenzaError> {
        self.publish_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| CadenzaError::Internal(e.to_string()))?;
            permit.forget();
        }
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(CadenzaError::surface("mock publish failure"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = ProjectionHandle {
            channel_id: now_playing.reply_target,
            message_id: MessageId(id),
        };
        self.published
            .lock()
            .await
            .push((handle, now_playing.clone()));
        Ok(handle)
    }

    async fn retire(&self, handle: ProjectionHandle) -> Result<(), CadenzaError> {
        self.retired.lock().await.push(handle);
        Ok(())
    }

    async fn notify(&self, channel: ChannelId, text: &str) -> Result<(), CadenzaError> {
        self.notices.lock().await.push((channel, text.to_string()));
        Ok(())
    }
}
