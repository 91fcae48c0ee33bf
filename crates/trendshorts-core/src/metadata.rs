//! Metadata returned by a metadata provider for a single video.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::Category;
use crate::duration::{iso_duration_from_secs, is_short_form_secs};

/// Provider-side view of a video. Empty strings and zero counts mean
/// "not reported".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Id as echoed back by the provider; may be empty.
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub channel_external_id: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub duration_secs: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: String,
    pub tags: Vec<String>,
    /// Free-text provider categories, most specific first.
    pub categories: Vec<String>,
}

impl VideoMetadata {
    /// Category derived from the first provider label.
    #[must_use]
    pub fn category(&self) -> Category {
        self.categories
            .first()
            .map_or(Category::Other, |label| Category::from_provider_label(label))
    }

    #[must_use]
    pub fn duration_iso(&self) -> String {
        iso_duration_from_secs(self.duration_secs)
    }

    #[must_use]
    pub fn is_short_form(&self) -> bool {
        is_short_form_secs(self.duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_uses_first_label_only() {
        let meta = VideoMetadata {
            categories: vec!["Gaming".into(), "Music".into()],
            ..VideoMetadata::default()
        };
        assert_eq!(meta.category(), Category::Gaming);
    }

    #[test]
    fn missing_categories_map_to_other() {
        assert_eq!(VideoMetadata::default().category(), Category::Other);
    }

    #[test]
    fn short_form_follows_duration() {
        let mut meta = VideoMetadata {
            duration_secs: 42,
            ..VideoMetadata::default()
        };
        assert!(meta.is_short_form());
        assert_eq!(meta.duration_iso(), "PT42S");

        meta.duration_secs = 0;
        assert!(!meta.is_short_form());
        assert_eq!(meta.duration_iso(), "PT0S");

        meta.duration_secs = 95;
        assert!(!meta.is_short_form());
        assert_eq!(meta.duration_iso(), "PT1M35S");
    }
}
