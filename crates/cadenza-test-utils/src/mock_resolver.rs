// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media resolver for deterministic testing.
//!
//! `MockResolver` implements `MediaResolver` without touching the network.
//! Every query resolves to an item titled after the query unless it was
//! marked as failing. A gated resolver parks every call until the test
//! releases it, which makes "stop while resolving" races reproducible.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use cadenza_core::{CadenzaError, Item, MediaResolver};

/// A resolver with scripted failures and an optional gate.
pub struct MockResolver {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockResolver {
    /// Create a resolver that answers every query immediately.
    pub fn new() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Create a resolver whose calls block until [`release`](Self::release).
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Make every future resolution of `query` fail.
    pub async fn fail_on(&self, query: &str) {
        self.failing.lock().await.insert(query.to_string());
    }

    /// Let `n` parked or future calls through the gate.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Queries received so far, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// The item a successful resolution of `query` produces.
    pub fn item_for(query: &str) -> Item {
        Item {
            title: query.to_string(),
            source_url: Some(format!("https://media.example/watch/{query}")),
            stream_url: format!("https://media.example/stream/{query}"),
            duration_secs: Some(180),
            thumbnail: None,
        }
    }
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaResolver for MockResolver {
    async fn resolve(&self, query: &str) -> Result<Item, CadenzaError> {
        self.calls.lock().await.push(query.to_string());

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| CadenzaError::Internal(e.to_string()))?;
            permit.forget();
        }

        if self.failing.lock().await.contains(query) {
            return Err(CadenzaError::Resolve {
                query: query.to_string(),
                message: "no results".to_string(),
            });
        }
        Ok(Self::item_for(query))
    }
}
