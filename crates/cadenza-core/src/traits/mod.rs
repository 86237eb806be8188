// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the playback scheduler.
//!
//! The scheduler never talks to a chat platform, a voice transport or a
//! media site directly. Each of those sits behind one of these traits and
//! uses `#[async_trait]` for dynamic dispatch.

pub mod resolver;
pub mod sink;
pub mod surface;

pub use resolver::MediaResolver;
pub use sink::{Sink, SinkProvider};
pub use surface::NowPlayingSurface;
