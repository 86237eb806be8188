// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cadenza playback scheduler.
//!
//! This crate provides the shared types, the error taxonomy and the narrow
//! collaborator traits (resolver, sink, now-playing surface) that the
//! scheduler in `cadenza-player` is written against. Platform adapters
//! implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CadenzaError;
pub use types::{
    ChannelId, GuildId, Item, MessageId, NowPlaying, PlaybackState, ProjectionHandle, Request,
    Requester, UserId,
};

pub use traits::{MediaResolver, NowPlayingSurface, Sink, SinkProvider};
