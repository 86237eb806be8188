// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the scheduler and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

snowflake!(
    /// Identity of a guild, the unit of playback isolation.
    GuildId
);
snowflake!(
    /// Identity of a text or voice channel.
    ChannelId
);
snowflake!(
    /// Identity of a user.
    UserId
);
snowflake!(
    /// Identity of a message posted to a channel.
    MessageId
);

/// The member who asked for a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// A pending playback request. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Free-form search string or URL handed to the resolver.
    pub query: String,
    pub requester: Requester,
    /// Text channel that receives the now-playing view and notices.
    pub reply_target: ChannelId,
}

impl Request {
    pub fn new(query: impl Into<String>, requester: Requester, reply_target: ChannelId) -> Self {
        Self {
            query: query.into(),
            requester,
            reply_target,
        }
    }
}

/// A playable item produced by a [`MediaResolver`](crate::MediaResolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    /// Page the item came from, shown to users.
    pub source_url: Option<String>,
    /// Direct audio stream handed to the sink.
    pub stream_url: String,
    pub duration_secs: Option<u64>,
    pub thumbnail: Option<String>,
}

/// The content of a now-playing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub item: Item,
    pub requester: Requester,
    pub reply_target: ChannelId,
}

impl NowPlaying {
    pub fn new(item: Item, request: &Request) -> Self {
        Self {
            item,
            requester: request.requester.clone(),
            reply_target: request.reply_target,
        }
    }

    /// Duration rendered as `MM:SS`; unknown durations render as `00:00`.
    pub fn duration_label(&self) -> String {
        let total = self.item.duration_secs.unwrap_or(0);
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

/// Where a published view lives, so it can be deleted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectionHandle {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// Observable state of a guild's playback session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No consumer task and nothing queued.
    #[default]
    Idle,
    /// The consumer popped a request and awaits the resolver.
    Resolving,
    /// The sink is presenting an item.
    Playing,
    /// A stop, leave or auto-leave is in progress.
    Terminating,
}
