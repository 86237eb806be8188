// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Now-playing projection slot.
//!
//! A guild has at most one live now-playing view. The slot owns the handle
//! of that view and makes sure the previous one is deleted before a new one
//! is posted, and that teardown or completion deletes whatever is left.

use std::sync::Arc;

use cadenza_core::{NowPlaying, NowPlayingSurface, ProjectionHandle};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Holds the single live now-playing view of a guild.
pub struct NowPlayingSlot {
    surface: Arc<dyn NowPlayingSurface>,
    current: Mutex<Option<(ProjectionHandle, NowPlaying)>>,
}

impl NowPlayingSlot {
    pub fn new(surface: Arc<dyn NowPlayingSurface>) -> Self {
        Self {
            surface,
            current: Mutex::new(None),
        }
    }

    /// Publishes a view for `now_playing`, retiring any previous one first.
    ///
    /// A failed publish is logged and leaves the slot empty; playback goes on
    /// without a view.
    pub async fn publish(&self, now_playing: NowPlaying) {
        let mut current = self.current.lock().await;
        if let Some((handle, _)) = current.take() {
            self.retire_handle(handle).await;
        }

        match self.surface.publish(&now_playing).await {
            Ok(handle) => {
                debug!(
                    channel_id = %handle.channel_id,
                    message_id = %handle.message_id,
                    title = %now_playing.item.title,
                    "now-playing view published"
                );
                *current = Some((handle, now_playing));
            }
            Err(e) => {
                warn!(
                    error = %e,
                    title = %now_playing.item.title,
                    "failed to publish now-playing view"
                );
            }
        }
    }

    /// Deletes the live view, if any. Returns `true` when one was present.
    pub async fn retire(&self) -> bool {
        let taken = self.current.lock().await.take();
        match taken {
            Some((handle, _)) => {
                self.retire_handle(handle).await;
                true
            }
            None => false,
        }
    }

    /// The item the live view describes.
    pub async fn current(&self) -> Option<NowPlaying> {
        self.current.lock().await.as_ref().map(|(_, np)| np.clone())
    }

    pub async fn is_live(&self) -> bool {
        self.current.lock().await.is_some()
    }

    async fn retire_handle(&self, handle: ProjectionHandle) {
        if let Err(e) = self.surface.retire(handle).await {
            // Best effort: the message may already be gone.
            debug!(
                error = %e,
                channel_id = %handle.channel_id,
                message_id = %handle.message_id,
                "failed to retire now-playing view"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use cadenza_core::{
        CadenzaError, ChannelId, Item, MessageId, Request, Requester, UserId,
    };

    use super::*;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct RecordingSurface {
        next_id: AtomicU64,
        fail_publish: bool,
        retired: StdMutex<Vec<ProjectionHandle>>,
    }

    #[async_trait]
    impl NowPlayingSurface for RecordingSurface {
        async fn publish(&self, np: &NowPlaying) -> Result<ProjectionHandle, CadenzaError> {
            if self.fail_publish {
                return Err(CadenzaError::surface("missing permissions"));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ProjectionHandle {
                channel_id: np.reply_target,
                message_id: MessageId(id),
            })
        }

        async fn retire(&self, handle: ProjectionHandle) -> Result<(), CadenzaError> {
            self.retired.lock().unwrap().push(handle);
            Ok(())
        }

        async fn notify(&self, _channel: ChannelId, _text: &str) -> Result<(), CadenzaError> {
            Ok(())
        }
    }

    fn now_playing(title: &str) -> NowPlaying {
        let request = Request::new(
            title,
            Requester {
                id: UserId(7),
                display_name: "dj".into(),
                avatar_url: None,
            },
            ChannelId(99),
        );
        let item = Item {
            title: title.into(),
            source_url: None,
            stream_url: format!("https://cdn.example/{title}"),
            duration_secs: Some(61),
            thumbnail: None,
        };
        NowPlaying::new(item, &request)
    }

    #[tokio::test]
    async fn publishing_twice_retires_the_first_view() {
        let surface = Arc::new(RecordingSurface::default());
        let slot = NowPlayingSlot::new(surface.clone());

        slot.publish(now_playing("first")).await;
        slot.publish(now_playing("second")).await;

        let retired = surface.retired.lock().unwrap().clone();
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].message_id, MessageId(1));
        assert_eq!(slot.current().await.unwrap().item.title, "second");
    }

    #[tokio::test]
    async fn retire_empties_the_slot_once() {
        let surface = Arc::new(RecordingSurface::default());
        let slot = NowPlayingSlot::new(surface.clone());

        slot.publish(now_playing("only")).await;
        assert!(slot.retire().await);
        assert!(!slot.retire().await);
        assert!(!slot.is_live().await);
        assert_eq!(surface.retired.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_publish_leaves_slot_empty() {
        let surface = Arc::new(RecordingSurface {
            fail_publish: true,
            ..Default::default()
        });
        let slot = NowPlayingSlot::new(surface);

        slot.publish(now_playing("nope")).await;
        assert!(slot.current().await.is_none());
        assert!(logs_contain("failed to publish now-playing view"));
    }
}
