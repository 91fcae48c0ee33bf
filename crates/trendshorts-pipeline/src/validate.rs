//! Drops unusable candidates and coerces the rest into storable shape.

use std::collections::HashSet;

use trendshorts_core::{is_valid_video_id, Candidate};

pub const TITLE_MAX_CHARS: usize = 500;
pub const CHANNEL_NAME_MAX_CHARS: usize = 200;
pub const CHANNEL_ID_MAX_CHARS: usize = 50;

/// Filtered batch in input order, plus why the rest were excluded.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub candidates: Vec<Candidate>,
    pub missing_id: usize,
    pub malformed_id: usize,
    pub missing_title: usize,
    pub duplicate: usize,
}

impl ValidationReport {
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.missing_id + self.malformed_id + self.missing_title + self.duplicate
    }
}

/// Never reorders; only removes entries or coerces fields.
#[must_use]
pub fn validate(candidates: Vec<Candidate>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen = HashSet::with_capacity(candidates.len());

    for mut candidate in candidates {
        let id = candidate.external_id();
        if id.is_empty() {
            report.missing_id += 1;
            continue;
        }
        if !is_valid_video_id(id) {
            tracing::debug!(video_id = id, "excluding malformed video id");
            report.malformed_id += 1;
            continue;
        }
        if candidate.title.trim().is_empty() {
            tracing::debug!(video_id = id, "excluding candidate without title");
            report.missing_title += 1;
            continue;
        }
        if !seen.insert(id.to_owned()) {
            tracing::debug!(video_id = id, "excluding duplicate candidate");
            report.duplicate += 1;
            continue;
        }

        candidate.view_count = candidate.view_count.max(0);
        candidate.like_count = candidate.like_count.max(0);
        candidate.comment_count = candidate.comment_count.max(0);
        truncate_chars(&mut candidate.title, TITLE_MAX_CHARS);
        truncate_chars(&mut candidate.channel_name, CHANNEL_NAME_MAX_CHARS);
        truncate_chars(&mut candidate.channel_external_id, CHANNEL_ID_MAX_CHARS);

        report.candidates.push(candidate);
    }

    if report.excluded() > 0 {
        tracing::info!(
            kept = report.candidates.len(),
            excluded = report.excluded(),
            "validation excluded candidates"
        );
    }
    report
}

fn truncate_chars(value: &mut String, max_chars: usize) {
    if let Some((byte_idx, _)) = value.char_indices().nth(max_chars) {
        value.truncate(byte_idx);
    }
}
