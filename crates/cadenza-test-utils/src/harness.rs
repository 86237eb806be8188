// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for scheduler integration testing.
//!
//! `TestHarness` assembles a [`SessionRegistry`] over mock collaborators and
//! keeps typed handles to each mock so tests can script resolution, drive
//! sink completion and inspect published views.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cadenza_core::{CadenzaError, ChannelId, GuildId, Request, Requester, UserId};
use cadenza_player::{Enqueued, SessionRegistry, SessionSettings};

use crate::mock_resolver::MockResolver;
use crate::mock_sink::{MockSink, MockSinkProvider};
use crate::mock_surface::MockSurface;

/// Channel test requests reply to.
pub const REPLY_CHANNEL: ChannelId = ChannelId(777);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    settings: SessionSettings,
    gated_resolver: bool,
    gated_surface: bool,
    instant_completion: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: SessionSettings {
                poll_interval: Duration::from_millis(5),
                notify_failures: false,
                disconnect_on_stop: true,
            },
            gated_resolver: false,
            gated_surface: false,
            instant_completion: false,
        }
    }

    /// Park every resolution until [`MockResolver::release`] is called.
    pub fn with_gated_resolver(mut self) -> Self {
        self.gated_resolver = true;
        self
    }

    /// Park every publish until [`MockSurface::release_publishes`] is called.
    pub fn with_gated_surface(mut self) -> Self {
        self.gated_surface = true;
        self
    }

    /// Finish every item as soon as the sink starts it.
    pub fn with_instant_completion(mut self) -> Self {
        self.instant_completion = true;
        self
    }

    pub fn with_failure_notices(mut self) -> Self {
        self.settings.notify_failures = true;
        self
    }

    pub fn with_disconnect_on_stop(mut self, disconnect: bool) -> Self {
        self.settings.disconnect_on_stop = disconnect;
        self
    }

    pub fn build(self) -> TestHarness {
        let resolver = Arc::new(if self.gated_resolver {
            MockResolver::gated()
        } else {
            MockResolver::new()
        });
        let sinks = Arc::new(if self.instant_completion {
            MockSinkProvider::with_instant_completion()
        } else {
            MockSinkProvider::new()
        });
        let surface = Arc::new(if self.gated_surface {
            MockSurface::gated()
        } else {
            MockSurface::new()
        });

        let registry = Arc::new(SessionRegistry::new(
            resolver.clone(),
            sinks.clone(),
            surface.clone(),
            self.settings,
        ));

        TestHarness {
            registry,
            resolver,
            sinks,
            surface,
        }
    }
}

/// A session registry wired to mock collaborators.
pub struct TestHarness {
    pub registry: Arc<SessionRegistry>,
    pub resolver: Arc<MockResolver>,
    pub sinks: Arc<MockSinkProvider>,
    pub surface: Arc<MockSurface>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings and an ungated resolver.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// A request for `query` from a fixed test user.
    pub fn request(query: &str) -> Request {
        Request::new(
            query,
            Requester {
                id: UserId(1),
                display_name: "tester".to_string(),
                avatar_url: None,
            },
            REPLY_CHANNEL,
        )
    }

    pub async fn enqueue(&self, guild_id: GuildId, query: &str) -> Result<Enqueued, CadenzaError> {
        self.registry.enqueue(guild_id, Self::request(query)).await
    }

    pub fn sink(&self, guild_id: GuildId) -> Arc<MockSink> {
        self.sinks.sink(guild_id)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls `check` until it returns `true` or two seconds pass.
///
/// Returns whether the condition was met.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
