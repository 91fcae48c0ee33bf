//! Offline unit tests for trendshorts-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::{NaiveDate, Utc};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use trendshorts_core::{AppConfig, Category, Environment};
use trendshorts_db::{CollectionRunRow, PoolConfig, RankedTrendingRow, TrendingVideoRow};
use uuid::Uuid;

fn video_row(rank: i32, category: &str) -> TrendingVideoRow {
    TrendingVideoRow {
        id: Uuid::new_v4(),
        youtube_id: "dQw4w9WgXcQ".to_string(),
        title: "A short".to_string(),
        description: String::new(),
        channel_title: "Channel".to_string(),
        channel_id: "UC123".to_string(),
        view_count: 1_000,
        like_count: 10,
        comment_count: 1,
        published_at: Utc::now(),
        duration: "PT45S".to_string(),
        thumbnail_url: String::new(),
        category: category.to_string(),
        tags: vec!["fun".to_string()],
        trending_rank: rank,
        trending_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        region_code: "KR".to_string(),
        is_shorts: true,
        collection_run_id: None,
        created_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        trending_url: "https://www.youtube.com/feed/trending".to_string(),
        region_code: "KR".to_string(),
        scraper_request_timeout_secs: 30,
        scraper_user_agent: "ua".to_string(),
        scraper_max_retries: 3,
        scraper_retry_backoff_base_secs: 5,
        extract_max_depth: 15,
        ytdlp_bin: "yt-dlp".to_string(),
        metadata_timeout_secs: 30,
        enrich_parallel: true,
        enrich_workers: 6,
        enrich_sequential_delay_ms: 300,
        metadata_cache_ttl_secs: 3600,
        metadata_cache_capacity: 10_000,
        collect_max_candidates: 50,
        collect_cron: "0 58 23 * * *".to_string(),
        retention_days: 30,
        retention_cron: "0 30 3 * * *".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn collection_run_row_has_expected_fields() {
    let row = CollectionRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        bucket_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        extracted_count: 0,
        enriched_count: 0,
        validated_count: 0,
        excluded_count: 0,
        created_count: 0,
        skipped_count: 0,
        failed_count: 0,
        started_at: None,
        completed_at: None,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.trigger_source, "cli");
    assert_eq!(row.status, "queued");
    assert!(row.started_at.is_none());
    assert!(row.error_message.is_none());
}

#[test]
fn trending_row_converts_into_record() {
    let record = video_row(3, "comedy").into_record().expect("valid row");
    assert_eq!(record.rank, 3);
    assert_eq!(record.category, Category::Comedy);
    assert_eq!(record.external_id, "dQw4w9WgXcQ");
    assert_eq!(record.channel_name, "Channel");
    assert!(record.is_short_form);
}

#[test]
fn trending_row_rejects_unknown_category() {
    assert!(video_row(1, "podcasts").into_record().is_err());
}

#[test]
fn trending_row_rejects_non_positive_rank() {
    assert!(video_row(0, "other").into_record().is_err());
}

#[test]
fn rank_change_is_positive_when_climbing() {
    let row = RankedTrendingRow {
        video: video_row(2, "other"),
        previous_rank: Some(5),
    };
    assert_eq!(row.rank_change(), Some(3));
    assert!(!row.is_new());

    let new_entry = RankedTrendingRow {
        video: video_row(1, "other"),
        previous_rank: None,
    };
    assert_eq!(new_entry.rank_change(), None);
    assert!(new_entry.is_new());
}
