// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted set of dedicated music channels.
//!
//! In a dedicated channel every plain message is treated as a play request.
//! The set lives in a small JSON file (`{"music_channels": [...]}`) that is
//! rewritten on every change; a missing file is an empty set.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use cadenza_core::{CadenzaError, ChannelId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct AllowListFile {
    #[serde(default)]
    music_channels: Vec<u64>,
}

/// Dedicated music channels, backed by a JSON file.
pub struct ChannelAllowList {
    path: PathBuf,
    channels: RwLock<BTreeSet<ChannelId>>,
}

impl ChannelAllowList {
    /// Loads the allow-list from `path`, starting empty if the file does not exist.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, CadenzaError> {
        let path = path.into();
        let channels = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: AllowListFile = serde_json::from_slice(&bytes)
                    .map_err(|e| CadenzaError::Storage { source: Box::new(e) })?;
                file.music_channels.into_iter().map(ChannelId).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no allow-list file, starting empty");
                BTreeSet::new()
            }
            Err(e) => return Err(CadenzaError::Storage { source: Box::new(e) }),
        };

        info!(path = %path.display(), channels = channels.len(), "music channel allow-list loaded");
        Ok(Self {
            path,
            channels: RwLock::new(channels),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn contains(&self, channel: ChannelId) -> bool {
        self.channels.read().await.contains(&channel)
    }

    /// Adds `channel` and persists. Returns `false` if it was already present.
    pub async fn add(&self, channel: ChannelId) -> Result<bool, CadenzaError> {
        let mut channels = self.channels.write().await;
        if !channels.insert(channel) {
            return Ok(false);
        }
        if let Err(e) = self.persist(&channels).await {
            channels.remove(&channel);
            return Err(e);
        }
        info!(%channel, "music channel added");
        Ok(true)
    }

    /// Removes `channel` and persists. Returns `false` if it was not present.
    pub async fn remove(&self, channel: ChannelId) -> Result<bool, CadenzaError> {
        let mut channels = self.channels.write().await;
        if !channels.remove(&channel) {
            return Ok(false);
        }
        if let Err(e) = self.persist(&channels).await {
            channels.insert(channel);
            return Err(e);
        }
        info!(%channel, "music channel removed");
        Ok(true)
    }

    pub async fn channels(&self) -> Vec<ChannelId> {
        self.channels.read().await.iter().copied().collect()
    }

    async fn persist(&self, channels: &BTreeSet<ChannelId>) -> Result<(), CadenzaError> {
        let file = AllowListFile {
            music_channels: channels.iter().map(|c| c.0).collect(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| CadenzaError::Storage { source: Box::new(e) })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CadenzaError::Storage { source: Box::new(e) })?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| CadenzaError::Storage { source: Box::new(e) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn load_logs_a_single_summary_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        tokio::fs::write(&path, r#"{"music_channels":[5,6]}"#)
            .await
            .unwrap();

        let list = ChannelAllowList::load(&path).await.unwrap();
        assert_eq!(list.channels().await.len(), 2);
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("music channel allow-list loaded"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one summary line, found {n}")),
            }
        });
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = ChannelAllowList::load(dir.path().join("channels.json"))
            .await
            .unwrap();
        assert!(list.channels().await.is_empty());
        assert!(!list.contains(ChannelId(1)).await);
    }

    #[tokio::test]
    async fn add_and_remove_persist_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("channels.json");

        let list = ChannelAllowList::load(&path).await.unwrap();
        assert!(list.add(ChannelId(20)).await.unwrap());
        assert!(list.add(ChannelId(10)).await.unwrap());
        assert!(!list.add(ChannelId(10)).await.unwrap());

        let reloaded = ChannelAllowList::load(&path).await.unwrap();
        assert_eq!(reloaded.channels().await, vec![ChannelId(10), ChannelId(20)]);

        assert!(reloaded.remove(ChannelId(10)).await.unwrap());
        assert!(!reloaded.remove(ChannelId(10)).await.unwrap());
        let again = ChannelAllowList::load(&path).await.unwrap();
        assert_eq!(again.channels().await, vec![ChannelId(20)]);
    }

    #[tokio::test]
    async fn file_format_is_music_channels_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        std::fs::write(&path, r#"{"music_channels": [111, 222]}"#).unwrap();

        let list = ChannelAllowList::load(&path).await.unwrap();
        assert!(list.contains(ChannelId(222)).await);

        list.add(ChannelId(333)).await.unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["music_channels"], serde_json::json!([111, 222, 333]));
    }

    #[tokio::test]
    async fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.json");
        std::fs::write(&path, "not json").unwrap();

        let err = ChannelAllowList::load(&path).await.err().unwrap();
        assert!(matches!(err, CadenzaError::Storage { .. }));
    }
}
