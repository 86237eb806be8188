// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cadenza music bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Cadenza configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CadenzaConfig {
    /// Bot identity and command settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Discord gateway settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Playback scheduler settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Media resolver settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Dedicated music channel settings.
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Bot identity and command configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prefix that marks a chat message as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            command_prefix: default_command_prefix(),
        }
    }
}

fn default_bot_name() -> String {
    "cadenza".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

/// Discord gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    /// Bot token. `None` is valid for `check-config` but `serve` requires it.
    #[serde(default)]
    pub token: Option<String>,

    /// How often the presence line ("playing in N servers") is refreshed.
    #[serde(default = "default_presence_interval_secs")]
    pub presence_interval_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            presence_interval_secs: default_presence_interval_secs(),
        }
    }
}

fn default_presence_interval_secs() -> u64 {
    24 * 60 * 60
}

/// Playback scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Interval between sink completion checks, in milliseconds.
    /// Also bounds how long a teardown waits for a consumer parked on the sink.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Output volume for every started item (0.0-1.0).
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Tell the requester when their query could not be resolved.
    #[serde(default)]
    pub notify_failures: bool,

    /// Whether `stop` also leaves the voice channel. `leave` always does.
    #[serde(default = "default_disconnect_on_stop")]
    pub disconnect_on_stop: bool,

    /// Accent colour of the now-playing embed.
    #[serde(default = "default_embed_color")]
    pub embed_color: u32,
}

impl PlaybackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            volume: default_volume(),
            notify_failures: false,
            disconnect_on_stop: default_disconnect_on_stop(),
            embed_color: default_embed_color(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_volume() -> f32 {
    0.08
}

fn default_disconnect_on_stop() -> bool {
    true
}

fn default_embed_color() -> u32 {
    0x1DB954
}

/// Media resolver (yt-dlp) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Path or name of the yt-dlp executable.
    #[serde(default = "default_resolver_binary")]
    pub binary: String,

    /// yt-dlp format selector.
    #[serde(default = "default_resolver_format")]
    pub format: String,

    /// Search prefix applied to queries that are not URLs.
    #[serde(default = "default_search")]
    pub default_search: String,

    /// Local address to bind outgoing connections to.
    #[serde(default)]
    pub source_address: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary: default_resolver_binary(),
            format: default_resolver_format(),
            default_search: default_search(),
            source_address: None,
        }
    }
}

fn default_resolver_binary() -> String {
    "yt-dlp".to_string()
}

fn default_resolver_format() -> String {
    "bestaudio/best".to_string()
}

fn default_search() -> String {
    "ytsearch1".to_string()
}

/// Dedicated music channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelsConfig {
    /// JSON file holding the allow-list of dedicated music channels.
    #[serde(default = "default_allowlist_path")]
    pub allowlist_path: String,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            allowlist_path: default_allowlist_path(),
        }
    }
}

fn default_allowlist_path() -> String {
    "music_channels.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CadenzaConfig::default();
        assert_eq!(config.bot.command_prefix, "!");
        assert_eq!(config.playback.poll_interval(), Duration::from_millis(500));
        assert!((config.playback.volume - 0.08).abs() < f32::EPSILON);
        assert!(config.playback.disconnect_on_stop);
        assert!(!config.playback.notify_failures);
        assert_eq!(config.resolver.default_search, "ytsearch1");
        assert_eq!(config.channels.allowlist_path, "music_channels.json");
        assert!(config.discord.token.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: CadenzaConfig = toml::from_str(
            r#"
[playback]
poll_interval_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(config.playback.poll_interval_ms, 250);
        assert_eq!(config.playback.embed_color, 0x1DB954);
        assert_eq!(config.bot.name, "cadenza");
    }

    #[test]
    fn unknown_playback_key_is_rejected() {
        let result = toml::from_str::<CadenzaConfig>(
            r#"
[playback]
pol_interval_ms = 250
"#,
        );
        assert!(result.is_err());
    }
}
