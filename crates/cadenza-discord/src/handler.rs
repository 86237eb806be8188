// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway event handling: commands, dedicated channels, buttons and
//! voice membership.
//!
//! The handler only translates Discord events into registry calls. All
//! playback state lives in the [`SessionRegistry`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serenity::all::{
    ChannelId as SerenityChannelId, Context, CreateInteractionResponse, CreateMessage,
    EventHandler, GuildId as SerenityGuildId, Interaction, Message, Ready,
    UserId as SerenityUserId, VoiceState,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cadenza_config::CadenzaConfig;
use cadenza_core::{CadenzaError, ChannelId, Request, Requester, UserId};
use cadenza_player::SessionRegistry;

use crate::allowlist::ChannelAllowList;
use crate::command::{self, Command};
use crate::voice::SongbirdSinks;
use crate::{embed, ids, presence, surface};

/// How long transient notices stay in the channel.
const NOTICE_TTL: Duration = Duration::from_secs(10);

/// Serenity event handler driving the playback registry.
pub struct Handler {
    registry: Arc<SessionRegistry>,
    sinks: Arc<SongbirdSinks>,
    allowlist: Arc<ChannelAllowList>,
    prefix: String,
    color: u32,
    presence_interval: Duration,
    presence_started: AtomicBool,
    shutdown: CancellationToken,
}

impl Handler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        sinks: Arc<SongbirdSinks>,
        allowlist: Arc<ChannelAllowList>,
        config: &CadenzaConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            sinks,
            allowlist,
            prefix: config.bot.command_prefix.clone(),
            color: config.playback.embed_color,
            presence_interval: Duration::from_secs(config.discord.presence_interval_secs),
            presence_started: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Maps a message to a command: prefixed commands anywhere, plain text
    /// in dedicated music channels.
    async fn command_for(&self, msg: &Message) -> Option<Command> {
        if let Some(command) = command::parse(&msg.content, &self.prefix) {
            return Some(command);
        }
        let content = msg.content.trim();
        if content.is_empty() || content.starts_with(&self.prefix) {
            return None;
        }
        if !self.allowlist.contains(ids::channel(msg.channel_id)).await {
            return None;
        }
        Some(Command::Play(content.to_string()))
    }

    async fn dispatch(
        &self,
        ctx: &Context,
        msg: &Message,
        guild: SerenityGuildId,
        command: Command,
    ) -> Result<(), CadenzaError> {
        let guild_id = ids::guild(guild);
        let reply_to = ids::channel(msg.channel_id);

        match command {
            Command::Play(query) => {
                let Some(voice) = self.require_voice(ctx, guild, msg).await else {
                    return Ok(());
                };
                self.sinks.ensure_joined(guild_id, voice).await?;
                let request = Request::new(query, requester_of(msg), reply_to);
                let enqueued = self.registry.enqueue(guild_id, request).await?;
                debug!(%guild_id, position = enqueued.position, "play request queued");
            }
            Command::Queue => {
                let pending = self.registry.snapshot_queue(guild_id).await;
                msg.channel_id
                    .send_message(
                        &ctx.http,
                        CreateMessage::new().embed(embed::queue_embed(&pending, self.color)),
                    )
                    .await
                    .map_err(|e| CadenzaError::Surface {
                        message: "failed to send queue listing".to_string(),
                        source: Some(Box::new(e)),
                    })?;
            }
            Command::Stop => {
                self.registry.stop(guild_id).await;
            }
            Command::Skip => {
                self.registry.skip(guild_id).await;
            }
            Command::Pause => {
                self.registry.pause(guild_id).await;
            }
            Command::Resume => {
                self.registry.resume(guild_id).await;
            }
            Command::Join => {
                if let Some(voice) = self.require_voice(ctx, guild, msg).await {
                    self.sinks.ensure_joined(guild_id, voice).await?;
                }
            }
            Command::Leave => {
                self.registry.leave(guild_id).await;
            }
            Command::AddChannel => {
                let text = if self.allowlist.add(reply_to).await? {
                    "✅ This channel is now a music channel."
                } else {
                    "This channel is already a music channel."
                };
                self.notice(ctx, reply_to, text).await;
            }
            Command::RemoveChannel => {
                let text = if self.allowlist.remove(reply_to).await? {
                    "🗑 This channel is no longer a music channel."
                } else {
                    "This channel is not a music channel."
                };
                self.notice(ctx, reply_to, text).await;
            }
        }
        Ok(())
    }

    /// The author's voice channel, or `None` after telling them to join one.
    async fn require_voice(
        &self,
        ctx: &Context,
        guild: SerenityGuildId,
        msg: &Message,
    ) -> Option<ChannelId> {
        let voice = author_voice_channel(ctx, guild, msg.author.id);
        if voice.is_none() {
            self.notice(
                ctx,
                ids::channel(msg.channel_id),
                "❌ Join a voice channel to use this command.",
            )
            .await;
        }
        voice
    }

    async fn notice(&self, ctx: &Context, channel: ChannelId, text: &str) {
        if let Err(e) = surface::send_notice(&ctx.http, channel, text, Some(NOTICE_TTL)).await {
            debug!(error = %e, "failed to send notice");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected to Discord");
        if !self.presence_started.swap(true, Ordering::SeqCst) {
            presence::spawn_presence_updates(
                ctx,
                self.presence_interval,
                self.shutdown.child_token(),
            );
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild) = msg.guild_id else {
            return;
        };
        let Some(command) = self.command_for(&msg).await else {
            return;
        };

        if let Err(e) = msg.delete(&ctx.http).await {
            debug!(error = %e, "could not delete command message");
        }
        debug!(guild_id = %guild, ?command, "command received");

        if let Err(e) = self.dispatch(&ctx, &msg, guild, command).await {
            warn!(guild_id = %guild, error = %e, "command failed");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Component(component) = interaction else {
            return;
        };
        let Some(guild) = component.guild_id else {
            return;
        };

        if let Err(e) = component
            .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
            .await
        {
            debug!(error = %e, "failed to acknowledge button press");
        }

        let guild_id = ids::guild(guild);
        match component.data.custom_id.as_str() {
            embed::TOGGLE_PAUSE_ID => {
                self.registry.toggle_pause(guild_id).await;
            }
            embed::SKIP_ID => {
                self.registry.skip(guild_id).await;
            }
            other => debug!(custom_id = other, "ignoring unknown component"),
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        if new.member.as_ref().is_some_and(|m| m.user.bot) {
            return;
        }
        let Some(guild) = new.guild_id else {
            return;
        };
        let Some(left) = old.and_then(|o| o.channel_id) else {
            return;
        };
        if new.channel_id == Some(left) {
            return;
        }
        let Some(humans) = humans_in_channel(&ctx, guild, left) else {
            return;
        };

        self.registry
            .on_membership_change(ids::guild(guild), ids::channel(left), humans)
            .await;
    }
}

/// Gateway intents the handler depends on.
pub fn intents() -> serenity::all::GatewayIntents {
    use serenity::all::GatewayIntents;
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_VOICE_STATES
}

fn requester_of(msg: &Message) -> Requester {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone());
    Requester {
        id: UserId(msg.author.id.get()),
        display_name,
        avatar_url: Some(msg.author.face()),
    }
}

fn author_voice_channel(
    ctx: &Context,
    guild: SerenityGuildId,
    user: SerenityUserId,
) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild)?;
    guild
        .voice_states
        .get(&user)
        .and_then(|state| state.channel_id)
        .map(ids::channel)
}

/// Non-bot users in `channel`; `None` when the guild is not cached.
fn humans_in_channel(
    ctx: &Context,
    guild: SerenityGuildId,
    channel: SerenityChannelId,
) -> Option<usize> {
    let guild = ctx.cache.guild(guild)?;
    let humans = guild
        .voice_states
        .values()
        .filter(|state| state.channel_id == Some(channel))
        .filter(|state| !is_bot(ctx, state))
        .count();
    Some(humans)
}

fn is_bot(ctx: &Context, state: &VoiceState) -> bool {
    match &state.member {
        Some(member) => member.user.bot,
        None => ctx.cache.user(state.user_id).is_some_and(|user| user.bot),
    }
}
