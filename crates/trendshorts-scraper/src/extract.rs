//! Candidate extraction from the page's initial-data tree.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use trendshorts_core::{is_valid_video_id, placeholder_title, Candidate};

use crate::error::ScraperError;

pub const DEFAULT_MAX_DEPTH: usize = 15;

const LOCKUP_KEY: &str = "shortsLockupViewModel";

/// Walks the initial-data tree and emits one [`Candidate`] per distinct
/// short-form lockup, in first-seen order.
///
/// Depth counts object nesting below the root; arrays are transparent.
/// Objects deeper than `max_depth` are not visited.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    max_depth: usize,
    collected_at: DateTime<Utc>,
}

impl CandidateExtractor {
    #[must_use]
    pub fn new(max_depth: usize, collected_at: DateTime<Utc>) -> Self {
        Self {
            max_depth,
            collected_at,
        }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::NotAnObject`] if `root` is not a JSON object.
    pub fn extract(&self, root: &Value) -> Result<Vec<Candidate>, ScraperError> {
        if !root.is_object() {
            return Err(ScraperError::NotAnObject {
                found: json_kind(root),
            });
        }

        let mut walk = Walk {
            seen: HashSet::new(),
            candidates: Vec::new(),
            lockups: 0,
        };
        self.visit(root, 0, &mut walk);

        tracing::info!(
            lockups = walk.lockups,
            candidates = walk.candidates.len(),
            "extracted short-form candidates"
        );
        Ok(walk.candidates)
    }

    fn visit(&self, node: &Value, depth: usize, walk: &mut Walk) {
        match node {
            Value::Object(map) => {
                if depth > self.max_depth {
                    return;
                }
                if let Some(lockup) = map.get(LOCKUP_KEY) {
                    walk.lockups += 1;
                    self.take_lockup(lockup, walk);
                }
                for value in map.values() {
                    self.visit(value, depth + 1, walk);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.visit(item, depth, walk);
                }
            }
            _ => {}
        }
    }

    fn take_lockup(&self, lockup: &Value, walk: &mut Walk) {
        let Some(video_id) = lockup
            .pointer("/onTap/innertubeCommand/reelWatchEndpoint/videoId")
            .and_then(Value::as_str)
        else {
            tracing::debug!("lockup without a video id");
            return;
        };

        if !is_valid_video_id(video_id) {
            tracing::debug!(video_id, "dropping malformed video id");
            return;
        }
        if !walk.seen.insert(video_id.to_owned()) {
            tracing::debug!(video_id, "duplicate video id in page");
            return;
        }

        let mut candidate = Candidate::new(video_id, self.collected_at);
        candidate.title = title_from_accessibility(lockup, video_id);
        candidate.thumbnail_url = lockup
            .pointer("/thumbnail/sources/0/url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        walk.candidates.push(candidate);
    }
}

struct Walk {
    seen: HashSet<String>,
    candidates: Vec<Candidate>,
    lockups: usize,
}

/// First comma-delimited segment of the accessibility text, else the
/// `"short {id}"` placeholder.
fn title_from_accessibility(lockup: &Value, video_id: &str) -> String {
    lockup
        .get("accessibilityText")
        .and_then(Value::as_str)
        .and_then(|text| text.split(',').next())
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map_or_else(|| placeholder_title(video_id), str::to_owned)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
