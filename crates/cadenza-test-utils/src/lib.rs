// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cadenza integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic,
//! CI-runnable scheduler tests without Discord, a voice connection or yt-dlp.
//!
//! # Components
//!
//! - [`MockResolver`] - Resolver with scripted failures and an optional gate
//! - [`MockSink`] / [`MockSinkProvider`] - Recording sinks with test-driven completion
//! - [`MockSurface`] - Surface capturing published views, retirements and notices
//! - [`TestHarness`] - Registry wired to all of the above

pub mod harness;
pub mod mock_resolver;
pub mod mock_sink;
pub mod mock_surface;

pub use harness::{REPLY_CHANNEL, TestHarness, TestHarnessBuilder, eventually};
pub use mock_resolver::MockResolver;
pub use mock_sink::{MOCK_VOICE_CHANNEL, MockSink, MockSinkProvider};
pub use mock_surface::MockSurface;
