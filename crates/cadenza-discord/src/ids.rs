// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between serenity snowflakes and Cadenza ids.
//!
//! Serenity ids are non-zero; a zero Cadenza id never comes from Discord,
//! so converting one back is clamped to 1 rather than panicking.

use serenity::all::{
    ChannelId as SerenityChannelId, GuildId as SerenityGuildId, MessageId as SerenityMessageId,
};

use cadenza_core::{ChannelId, GuildId, MessageId};

pub fn guild(id: SerenityGuildId) -> GuildId {
    GuildId(id.get())
}

pub fn channel(id: SerenityChannelId) -> ChannelId {
    ChannelId(id.get())
}

pub fn to_serenity_guild(id: GuildId) -> SerenityGuildId {
    SerenityGuildId::new(id.0.max(1))
}

pub fn to_serenity_channel(id: ChannelId) -> SerenityChannelId {
    SerenityChannelId::new(id.0.max(1))
}

pub fn to_serenity_message(id: MessageId) -> SerenityMessageId {
    SerenityMessageId::new(id.0.max(1))
}
