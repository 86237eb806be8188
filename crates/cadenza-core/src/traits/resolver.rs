// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media resolution: turning a search string into a playable item.

use async_trait::async_trait;

use crate::error::CadenzaError;
use crate::types::Item;

/// Resolves a free-form query into a playable [`Item`].
///
/// Latency is unbounded and implementations are not required to be
/// cancellation-aware; the scheduler drops the future when it no longer
/// wants the result.
#[async_trait]
pub trait MediaResolver: Send + Sync + 'static {
    /// Resolves `query`, failing with [`CadenzaError::Resolve`] when nothing playable is found.
    async fn resolve(&self, query: &str) -> Result<Item, CadenzaError>;
}
