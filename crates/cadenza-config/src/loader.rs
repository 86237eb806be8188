// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./cadenza.toml` > `~/.config/cadenza/cadenza.toml` > `/etc/cadenza/cadenza.toml`
//! with environment variable overrides via `CADENZA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CadenzaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cadenza/cadenza.toml` (system-wide)
/// 3. `~/.config/cadenza/cadenza.toml` (user XDG config)
/// 4. `./cadenza.toml` (local directory)
/// 5. `CADENZA_*` environment variables
pub fn load_config() -> Result<CadenzaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CadenzaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CadenzaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CadenzaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CadenzaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CadenzaConfig::default()))
        .merge(Toml::file("/etc/cadenza/cadenza.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("cadenza/cadenza.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("cadenza.toml"))
        .merge(env_provider())
}

/// Environment provider with an explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `CADENZA_PLAYBACK_POLL_INTERVAL_MS` must map to
/// `playback.poll_interval_ms`, not `playback.poll.interval.ms`.
fn env_provider() -> Env {
    Env::prefixed("CADENZA_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("bot_", "bot.", 1)
            .replacen("discord_", "discord.", 1)
            .replacen("playback_", "playback.", 1)
            .replacen("resolver_", "resolver.", 1)
            .replacen("channels_", "channels.", 1);
        mapped.into()
    })
}
