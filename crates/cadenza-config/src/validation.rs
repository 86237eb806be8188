// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as value ranges and non-empty strings.

use crate::diagnostic::ConfigError;
use crate::model::CadenzaConfig;

/// Longest completion poll interval accepted. Keeps teardown latency sub-second.
pub const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CadenzaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.bot.command_prefix.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "bot.command_prefix must not be empty".to_string(),
        });
    }

    let poll = config.playback.poll_interval_ms;
    if poll == 0 || poll > MAX_POLL_INTERVAL_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "playback.poll_interval_ms must be between 1 and {MAX_POLL_INTERVAL_MS}, got {poll}"
            ),
        });
    }

    let volume = config.playback.volume;
    if !(0.0..=1.0).contains(&volume) {
        errors.push(ConfigError::Validation {
            message: format!("playback.volume must be between 0.0 and 1.0, got {volume}"),
        });
    }

    if config.playback.embed_color > 0xFF_FFFF {
        errors.push(ConfigError::Validation {
            message: format!(
                "playback.embed_color must be a 24-bit RGB value, got {:#x}",
                config.playback.embed_color
            ),
        });
    }

    if config.resolver.binary.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "resolver.binary must not be empty".to_string(),
        });
    }

    if config.channels.allowlist_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "channels.allowlist_path must not be empty".to_string(),
        });
    }

    if config.discord.presence_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "discord.presence_interval_secs must be greater than zero".to_string(),
        });
    }

    if let Some(token) = &config.discord.token {
        if token.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "discord.token must not be empty when set".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
