// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-guild playback scheduler for the Cadenza music bot.
//!
//! The [`SessionRegistry`] is the entry point. It lazily creates one
//! [`PlaybackSession`] per guild, and each session:
//! - Keeps a FIFO [`GuildQueue`] of pending requests
//! - Runs at most one consumer task that resolves, announces and plays them
//! - Owns the guild's single now-playing view ([`NowPlayingSlot`])
//! - Tears down on stop, leave, auto-leave or shutdown without leaking a
//!   view, a task or a queued request
//!
//! Chat, voice and media resolution are reached only through the traits in
//! `cadenza-core`, so the scheduler runs unchanged against test doubles.

pub mod projection;
pub mod queue;
pub mod registry;
pub mod session;
pub mod shutdown;

pub use projection::NowPlayingSlot;
pub use queue::GuildQueue;
pub use registry::SessionRegistry;
pub use session::{Enqueued, PlaybackSession, SessionSettings, TeardownReason};
pub use shutdown::{drain_sessions, install_signal_handler};
