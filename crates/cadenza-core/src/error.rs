// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cadenza playback scheduler.

use thiserror::Error;

/// The primary error type shared by the collaborator traits and the scheduler.
#[derive(Debug, Error)]
pub enum CadenzaError {
    /// Configuration errors (missing token, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The media resolver returned nothing or failed for a query.
    #[error("could not resolve `{query}`: {message}")]
    Resolve { query: String, message: String },

    /// The sink has no live voice connection; playback cannot start at all.
    #[error("sink is not connected to a voice channel")]
    SinkNotConnected,

    /// The sink refused to start a single item.
    #[error("sink rejected playback: {message}")]
    SinkRejected { message: String },

    /// Publishing or deleting an external representation failed.
    #[error("surface error: {message}")]
    Surface {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A producer reached a session that is being torn down.
    #[error("playback session has been retired")]
    SessionRetired,

    /// Persistence errors (allow-list file I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (gateway, HTTP, voice join).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CadenzaError {
    /// Returns `true` when the error means the session cannot make progress
    /// and should terminate instead of moving on to the next request.
    pub fn is_structural(&self) -> bool {
        matches!(self, CadenzaError::SinkNotConnected)
    }

    /// Shorthand for a [`CadenzaError::Surface`] without an underlying source.
    pub fn surface(message: impl Into<String>) -> Self {
        CadenzaError::Surface {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`CadenzaError::Channel`] wrapping a transport error.
    pub fn channel<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CadenzaError::Channel {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
