//! The transient per-video record that flows through one collection run.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const VIDEO_ID_MIN_LEN: usize = 8;
pub const VIDEO_ID_MAX_LEN: usize = 15;

/// Default duration for entries collected from the short-form shelf before
/// any metadata is known.
pub const DEFAULT_DURATION_ISO: &str = "PT60S";

/// Returns `true` when `id` is 8–15 characters drawn from `[A-Za-z0-9_-]`.
#[must_use]
pub fn is_valid_video_id(id: &str) -> bool {
    (VIDEO_ID_MIN_LEN..=VIDEO_ID_MAX_LEN).contains(&id.len())
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Title used when neither the page nor the metadata provider supplied one.
#[must_use]
pub fn placeholder_title(external_id: &str) -> String {
    format!("short {external_id}")
}

/// Fixed category enumeration stored on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Music,
    Gaming,
    Entertainment,
    Sports,
    News,
    Education,
    Tech,
    Comedy,
    Lifestyle,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Music,
        Category::Gaming,
        Category::Entertainment,
        Category::Sports,
        Category::News,
        Category::Education,
        Category::Tech,
        Category::Comedy,
        Category::Lifestyle,
        Category::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Gaming => "gaming",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::News => "news",
            Category::Education => "education",
            Category::Tech => "tech",
            Category::Comedy => "comedy",
            Category::Lifestyle => "lifestyle",
            Category::Other => "other",
        }
    }

    /// Maps a provider's free-text category label onto the enumeration.
    ///
    /// Compound labels such as `"Science & Technology"` or `"Howto & Style"`
    /// are matched by their first word. Unmapped labels become [`Category::Other`].
    ///
    /// The first-word fallback is intentionally wider than an exact-label table,
    /// so `"News & Politics"` lands in news rather than other.
    #[must_use]
    pub fn from_provider_label(label: &str) -> Self {
        let lowered = label.trim().to_lowercase();
        if let Some(category) = Self::lookup(&lowered) {
            return category;
        }
        lowered
            .split(|c: char| c.is_whitespace() || c == '&' || c == ',')
            .find(|word| !word.is_empty())
            .and_then(Self::lookup)
            .unwrap_or(Category::Other)
    }

    fn lookup(key: &str) -> Option<Self> {
        let category = match key {
            "music" => Category::Music,
            "gaming" => Category::Gaming,
            "entertainment" => Category::Entertainment,
            "sports" => Category::Sports,
            "news" => Category::News,
            "education" => Category::Education,
            "science" | "technology" => Category::Tech,
            "comedy" => Category::Comedy,
            "howto" | "style" | "travel" => Category::Lifestyle,
            _ => return None,
        };
        Some(category)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::InvalidCategory(s.to_string()))
    }
}

/// A discovered video during one pipeline run.
///
/// The `external_id` is fixed at construction; later stages may enrich the
/// remaining fields or drop the candidate but never change its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    external_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub channel_external_id: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub published_at: DateTime<Utc>,
    pub duration_iso: String,
    pub thumbnail_url: String,
    pub category: Category,
    pub tags: Vec<String>,
    /// Dense 1-based position; `None` until rank assignment.
    pub rank: Option<u32>,
    pub is_short_form: bool,
}

impl Candidate {
    /// Creates a candidate with every field at its documented default.
    ///
    /// `collected_at` stands in for `published_at` until metadata says otherwise.
    #[must_use]
    pub fn new(external_id: impl Into<String>, collected_at: DateTime<Utc>) -> Self {
        let external_id = external_id.into();
        let title = placeholder_title(&external_id);
        Self {
            external_id,
            title,
            description: String::new(),
            channel_name: String::new(),
            channel_external_id: String::new(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            published_at: collected_at,
            duration_iso: DEFAULT_DURATION_ISO.to_string(),
            thumbnail_url: String::new(),
            category: Category::Other,
            tags: Vec::new(),
            rank: None,
            is_short_form: true,
        }
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// `true` when the title is the synthesized `"short {id}"` fallback.
    #[must_use]
    pub fn has_placeholder_title(&self) -> bool {
        self.title == placeholder_title(&self.external_id)
    }

    #[must_use]
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.external_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_accepts_typical_ids() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("AAAAAAAA"));
        assert!(is_valid_video_id("a_b-c_d-e_f-g_h"));
    }

    #[test]
    fn video_id_rejects_out_of_range_lengths() {
        assert!(!is_valid_video_id("abc"));
        assert!(!is_valid_video_id("abcdefg"));
        assert!(!is_valid_video_id("abcdefghijklmnop"));
        assert!(!is_valid_video_id("abcdefghijklmnopqrst"));
        assert!(!is_valid_video_id(""));
    }

    #[test]
    fn video_id_rejects_foreign_characters() {
        assert!(!is_valid_video_id("abc def12"));
        assert!(!is_valid_video_id("abc.def12"));
        assert!(!is_valid_video_id("ümlautsid"));
    }

    #[test]
    fn new_candidate_uses_defaults() {
        let now = Utc::now();
        let c = Candidate::new("AAAAAAAA", now);
        assert_eq!(c.external_id(), "AAAAAAAA");
        assert_eq!(c.title, "short AAAAAAAA");
        assert!(c.has_placeholder_title());
        assert_eq!(c.duration_iso, "PT60S");
        assert_eq!(c.category, Category::Other);
        assert_eq!(c.published_at, now);
        assert!(c.rank.is_none());
        assert!(c.is_short_form);
        assert_eq!(c.watch_url(), "https://www.youtube.com/watch?v=AAAAAAAA");
    }

    #[test]
    fn category_maps_simple_labels() {
        assert_eq!(Category::from_provider_label("Music"), Category::Music);
        assert_eq!(Category::from_provider_label("Gaming"), Category::Gaming);
        assert_eq!(Category::from_provider_label("Comedy"), Category::Comedy);
        assert_eq!(Category::from_provider_label("Technology"), Category::Tech);
    }

    #[test]
    fn category_maps_compound_labels_by_first_word() {
        assert_eq!(
            Category::from_provider_label("Science & Technology"),
            Category::Tech
        );
        assert_eq!(
            Category::from_provider_label("Howto & Style"),
            Category::Lifestyle
        );
        assert_eq!(
            Category::from_provider_label("Travel & Events"),
            Category::Lifestyle
        );
        assert_eq!(
            Category::from_provider_label("News & Politics"),
            Category::News
        );
    }

    #[test]
    fn category_unmapped_labels_become_other() {
        assert_eq!(
            Category::from_provider_label("People & Blogs"),
            Category::Other
        );
        assert_eq!(
            Category::from_provider_label("Film & Animation"),
            Category::Other
        );
        assert_eq!(Category::from_provider_label(""), Category::Other);
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("podcasts".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Lifestyle).unwrap();
        assert_eq!(json, "\"lifestyle\"");
    }
}
