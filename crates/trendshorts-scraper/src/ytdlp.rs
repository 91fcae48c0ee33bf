//! `yt-dlp` backed metadata provider.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use trendshorts_core::{AppConfig, VideoMetadata};

use crate::error::ProviderError;
use crate::provider::MetadataProvider;

/// Runs `yt-dlp --dump-json` once per video. Each instance is independent, so
/// every enrichment worker can own one.
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    bin: String,
    timeout: Duration,
}

impl YtDlpProvider {
    #[must_use]
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.ytdlp_bin.clone(),
            Duration::from_secs(config.metadata_timeout_secs),
        )
    }
}

#[async_trait]
impl MetadataProvider for YtDlpProvider {
    async fn fetch_metadata(&self, video_id: &str) -> Result<VideoMetadata, ProviderError> {
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let output = timeout(
            self.timeout,
            Command::new(&self.bin)
                .args([
                    "--dump-json",
                    "--skip-download",
                    "--no-warnings",
                    "--no-playlist",
                    url.as_str(),
                ])
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ProviderError::Timeout {
            video_id: video_id.to_owned(),
            timeout_secs: self.timeout.as_secs(),
        })?
        .map_err(ProviderError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            if is_unavailable(&stderr) {
                return Err(ProviderError::Unavailable {
                    video_id: video_id.to_owned(),
                });
            }
            return Err(ProviderError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        parse_ytdlp_json(video_id, &output.stdout)
    }
}

fn is_unavailable(stderr: &str) -> bool {
    let lowered = stderr.to_ascii_lowercase();
    ["private video", "video unavailable", "has been removed"]
        .iter()
        .any(|needle| lowered.contains(needle))
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    uploader_id: Option<String>,
    #[serde(default)]
    view_count: Option<i64>,
    #[serde(default)]
    like_count: Option<i64>,
    #[serde(default)]
    comment_count: Option<i64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    categories: Option<Vec<String>>,
}

/// Parses one `--dump-json` document. Absent or null fields become empty
/// strings, zero counts and `None`.
///
/// # Errors
///
/// Returns [`ProviderError::Deserialize`] if `stdout` is not a JSON object of
/// the expected shape.
pub fn parse_ytdlp_json(video_id: &str, stdout: &[u8]) -> Result<VideoMetadata, ProviderError> {
    let info: YtDlpInfo =
        serde_json::from_slice(stdout).map_err(|source| ProviderError::Deserialize {
            video_id: video_id.to_owned(),
            source,
        })?;

    Ok(VideoMetadata {
        video_id: info.id.unwrap_or_default(),
        title: info.title.unwrap_or_default(),
        description: info.description.unwrap_or_default(),
        channel_name: info.channel.or(info.uploader).unwrap_or_default(),
        channel_external_id: info.channel_id.or(info.uploader_id).unwrap_or_default(),
        view_count: info.view_count.unwrap_or(0),
        like_count: info.like_count.unwrap_or(0),
        comment_count: info.comment_count.unwrap_or(0),
        duration_secs: info.duration.map_or(0, duration_secs),
        published_at: info.upload_date.as_deref().and_then(parse_upload_date),
        thumbnail_url: info.thumbnail.unwrap_or_default(),
        tags: info.tags.unwrap_or_default(),
        categories: info.categories.unwrap_or_default(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_secs(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.round() as u64
    } else {
        0
    }
}

/// `YYYYMMDD` at midnight UTC.
fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
