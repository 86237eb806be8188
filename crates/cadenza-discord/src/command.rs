// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prefix command parsing.
//!
//! Pure string handling, kept apart from the event handler so every alias
//! and edge case can be tested without a gateway connection.

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `p <query>`: queue a track, joining the caller's voice channel if needed.
    Play(String),
    /// `q` / `queue`: show pending requests.
    Queue,
    Stop,
    Skip,
    Pause,
    Resume,
    Join,
    Leave,
    /// Mark the current text channel as a dedicated music channel.
    AddChannel,
    RemoveChannel,
}

/// Parses `content` as a command if it starts with `prefix`.
///
/// Command names are case-insensitive. Unknown commands and `p` without a
/// query yield `None`.
pub fn parse(content: &str, prefix: &str) -> Option<Command> {
    let body = content.trim().strip_prefix(prefix)?;
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "p" | "play" if !rest.is_empty() => Command::Play(rest.to_string()),
        "q" | "queue" => Command::Queue,
        "stop" => Command::Stop,
        "skip" => Command::Skip,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "join" => Command::Join,
        "leave" => Command::Leave,
        "addchannel" => Command::AddChannel,
        "removechannel" => Command::RemoveChannel,
        _ => return None,
    };
    Some(command)
}
