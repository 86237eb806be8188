// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media resolver backed by the `yt-dlp` command-line tool.
//!
//! Each resolution runs `yt-dlp --dump-json` once and reads the first
//! result. Free-text queries go through yt-dlp's default search; URLs are
//! passed through unchanged. The child process is killed if the resolve
//! future is dropped, so a cancelled resolution leaves nothing running.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use cadenza_config::ResolverConfig;
use cadenza_core::{CadenzaError, Item, MediaResolver};

/// Resolves queries by shelling out to `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    config: ResolverConfig,
}

impl YtDlpResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Command-line arguments for resolving `query`.
    pub fn args_for(&self, query: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--format".to_string(),
            self.config.format.clone(),
            "--default-search".to_string(),
            self.config.default_search.clone(),
        ];
        if let Some(address) = &self.config.source_address {
            args.push("--source-address".to_string());
            args.push(address.clone());
        }
        args.push("--".to_string());
        args.push(query.to_string());
        args
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Item, CadenzaError> {
        debug!(query, binary = %self.config.binary, "resolving with yt-dlp");

        let output = Command::new(&self.config.binary)
            .args(self.args_for(query))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| resolve_error(query, format!("failed to run {}: {e}", self.config.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("yt-dlp exited with an error");
            return Err(resolve_error(query, reason.trim().to_string()));
        }

        let item = parse_info(query, &output.stdout)?;
        debug!(query, title = %item.title, "resolved");
        Ok(item)
    }
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    entries: Option<Vec<VideoInfo>>,
}

/// Parses the JSON yt-dlp prints for one query into a playable [`Item`].
///
/// Search results arrive as a playlist; the first entry wins.
pub fn parse_info(query: &str, stdout: &[u8]) -> Result<Item, CadenzaError> {
    // --dump-json prints one object per line; the first is the result.
    let line = stdout
        .split(|b| *b == b'\n')
        .find(|line| !line.iter().all(u8::is_ascii_whitespace))
        .ok_or_else(|| resolve_error(query, "no results".to_string()))?;

    let mut info: VideoInfo = serde_json::from_slice(line)
        .map_err(|e| resolve_error(query, format!("unreadable yt-dlp output: {e}")))?;

    if let Some(entries) = info.entries.take() {
        info = entries
            .into_iter()
            .next()
            .ok_or_else(|| resolve_error(query, "no results".to_string()))?;
    }

    let stream_url = info
        .url
        .ok_or_else(|| resolve_error(query, "result has no stream URL".to_string()))?;

    Ok(Item {
        title: info.title.unwrap_or_else(|| query.to_string()),
        source_url: info.webpage_url,
        stream_url,
        duration_secs: info
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u64),
        thumbnail: info.thumbnail,
    })
}

fn resolve_error(query: &str, message: String) -> CadenzaError {
    CadenzaError::Resolve {
        query: query.to_string(),
        message,
    }
}
