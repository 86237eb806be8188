// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord adapter for Cadenza.
//!
//! Connects the playback scheduler in `cadenza-player` to Discord:
//! - [`handler::Handler`] turns gateway events into registry calls.
//! - [`voice::SongbirdSinks`] provides per-guild songbird audio sinks.
//! - [`surface::DiscordSurface`] posts and deletes now-playing embeds.
//! - [`allowlist::ChannelAllowList`] persists dedicated music channels.

pub mod allowlist;
pub mod command;
pub mod embed;
pub mod handler;
pub mod ids;
pub mod presence;
pub mod surface;
pub mod voice;

pub use allowlist::ChannelAllowList;
pub use command::Command;
pub use handler::{Handler, intents};
pub use surface::DiscordSurface;
pub use voice::{SongbirdSink, SongbirdSinks};
