//! The persisted, one-per-video-per-day trending record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidate::{Candidate, Category};
use crate::CoreError;

/// Insert payload for a trending record. The store assigns `record_id`
/// and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrendingRecord {
    pub external_id: String,
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
    pub rank: u32,
    pub collection_date: NaiveDate,
    pub region_code: String,
    pub is_short_form: bool,
    pub collection_run_id: Option<i64>,
}

impl NewTrendingRecord {
    /// Builds the insert payload for a ranked candidate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unranked`] if rank assignment has not run.
    pub fn from_candidate(
        candidate: &Candidate,
        collection_date: NaiveDate,
        region_code: &str,
        collection_run_id: Option<i64>,
    ) -> Result<Self, CoreError> {
        let rank = candidate.rank.ok_or_else(|| CoreError::Unranked {
            external_id: candidate.external_id().to_string(),
        })?;
        Ok(Self {
            external_id: candidate.external_id().to_string(),
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            channel_name: candidate.channel_name.clone(),
            channel_external_id: candidate.channel_external_id.clone(),
            view_count: candidate.view_count,
            like_count: candidate.like_count,
            comment_count: candidate.comment_count,
            published_at: candidate.published_at,
            duration_iso: candidate.duration_iso.clone(),
            thumbnail_url: candidate.thumbnail_url.clone(),
            category: candidate.category,
            tags: candidate.tags.clone(),
            rank,
            collection_date,
            region_code: region_code.to_string(),
            is_short_form: candidate.is_short_form,
            collection_run_id,
        })
    }

    /// Materialises the stored record once the store has assigned identity.
    #[must_use]
    pub fn into_record(self, record_id: Uuid, created_at: DateTime<Utc>) -> TrendingRecord {
        TrendingRecord {
            record_id,
            external_id: self.external_id,
            title: self.title,
            description: self.description,
            channel_name: self.channel_name,
            channel_external_id: self.channel_external_id,
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            published_at: self.published_at,
            duration_iso: self.duration_iso,
            thumbnail_url: self.thumbnail_url,
            category: self.category,
            tags: self.tags,
            rank: self.rank,
            collection_date: self.collection_date,
            region_code: self.region_code,
            is_short_form: self.is_short_form,
            collection_run_id: self.collection_run_id,
            created_at,
        }
    }
}

/// A stored trending record. Unique per `(external_id, collection_date)` and
/// never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingRecord {
    pub record_id: Uuid,
    pub external_id: String,
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
    pub rank: u32,
    pub collection_date: NaiveDate,
    pub region_code: String,
    pub is_short_form: bool,
    pub collection_run_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_candidate_requires_rank() {
        let candidate = Candidate::new("AAAAAAAA", Utc::now());
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = NewTrendingRecord::from_candidate(&candidate, date, "KR", None).unwrap_err();
        assert!(matches!(err, CoreError::Unranked { ref external_id } if external_id == "AAAAAAAA"));
    }

    #[test]
    fn from_candidate_copies_fields() {
        let mut candidate = Candidate::new("BBBBBBBB", Utc::now());
        candidate.rank = Some(3);
        candidate.view_count = 1_234;
        candidate.category = Category::Comedy;
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let new = NewTrendingRecord::from_candidate(&candidate, date, "KR", Some(9)).unwrap();
        assert_eq!(new.external_id, "BBBBBBBB");
        assert_eq!(new.rank, 3);
        assert_eq!(new.view_count, 1_234);
        assert_eq!(new.category, Category::Comedy);
        assert_eq!(new.collection_date, date);
        assert_eq!(new.collection_run_id, Some(9));

        let record_id = Uuid::new_v4();
        let record = new.into_record(record_id, Utc::now());
        assert_eq!(record.record_id, record_id);
        assert_eq!(record.external_id, "BBBBBBBB");
    }
}
