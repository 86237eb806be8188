// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embed and component builders for the now-playing view and queue listing.

use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
};

use cadenza_core::{NowPlaying, Request};

/// Custom id of the pause/resume button.
pub const TOGGLE_PAUSE_ID: &str = "cadenza:toggle_pause";
/// Custom id of the skip button.
pub const SKIP_ID: &str = "cadenza:skip";

/// Embeds hold at most 25 fields.
const MAX_QUEUE_FIELDS: usize = 25;

pub fn now_playing_embed(now_playing: &NowPlaying, color: u32) -> CreateEmbed {
    let item = &now_playing.item;
    let description = match &item.source_url {
        Some(url) => format!("[{}]({url})", item.title),
        None => item.title.clone(),
    };

    let mut footer = CreateEmbedFooter::new(&now_playing.requester.display_name);
    if let Some(avatar) = &now_playing.requester.avatar_url {
        footer = footer.icon_url(avatar);
    }

    let mut embed = CreateEmbed::new()
        .title("🎶 Now playing")
        .description(description)
        .color(color)
        .field("Duration", now_playing.duration_label(), true)
        .footer(footer);
    if let Some(thumbnail) = &item.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// The pause/resume and skip buttons attached to every now-playing view.
pub fn controls() -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(TOGGLE_PAUSE_ID)
            .label("⏯")
            .style(ButtonStyle::Primary),
        CreateButton::new(SKIP_ID)
            .label("⏭")
            .style(ButtonStyle::Secondary),
    ])
}

pub fn queue_embed(pending: &[Request], color: u32) -> CreateEmbed {
    let embed = CreateEmbed::new().title("🎶 Queue").color(color);
    if pending.is_empty() {
        return embed.description("📭 Nothing is queued.");
    }

    let mut embed = embed.fields(
        pending
            .iter()
            .take(MAX_QUEUE_FIELDS)
            .enumerate()
            .map(|(i, request)| queue_field(i + 1, request)),
    );
    if pending.len() > MAX_QUEUE_FIELDS {
        embed = embed.description(format!("{} requests pending", pending.len()));
    }
    embed
}

fn queue_field(position: usize, request: &Request) -> (String, String, bool) {
    (
        format!("{position}. {}", request.query),
        request.requester.display_name.clone(),
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::{ChannelId, Item, Requester, UserId};
    use serde_json::Value;

    fn request(query: &str) -> Request {
        Request::new(
            query,
            Requester {
                id: UserId(5),
                display_name: "mina".into(),
                avatar_url: Some("https://cdn.example/avatar.png".into()),
            },
            ChannelId(9),
        )
    }

    fn to_json(embed: CreateEmbed) -> Value {
        serde_json::to_value(embed).unwrap()
    }

    #[test]
    fn now_playing_links_title_and_shows_duration() {
        let item = Item {
            title: "Song".into(),
            source_url: Some("https://youtube.example/watch?v=1".into()),
            stream_url: "https://cdn.example/1".into(),
            duration_secs: Some(125),
            thumbnail: Some("https://img.example/1.jpg".into()),
        };
        let np = NowPlaying::new(item, &request("song"));
        let json = to_json(now_playing_embed(&np, 0x1DB954));

        assert_eq!(json["title"], "🎶 Now playing");
        assert_eq!(json["description"], "[Song](https://youtube.example/watch?v=1)");
        assert_eq!(json["fields"][0]["value"], "02:05");
        assert_eq!(json["footer"]["text"], "mina");
        assert_eq!(json["thumbnail"]["url"], "https://img.example/1.jpg");
    }

    #[test]
    fn empty_queue_has_notice() {
        let json = to_json(queue_embed(&[], 0));
        assert_eq!(json["description"], "📭 Nothing is queued.");
    }

    #[test]
    fn queue_lists_requests_in_order() {
        let json = to_json(queue_embed(&[request("a"), request("b")], 0));
        assert_eq!(json["fields"][0]["name"], "1. a");
        assert_eq!(json["fields"][1]["name"], "2. b");
        assert_eq!(json["fields"][1]["value"], "mina");
    }
}
