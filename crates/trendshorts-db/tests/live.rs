//! Live integration tests for trendshorts-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness.

use chrono::{NaiveDate, Utc};
use trendshorts_core::{Candidate, Category, NewTrendingRecord};
use trendshorts_db::{
    complete_collection_run, count_trending_videos_before, create_collection_run,
    delete_trending_stats_before, delete_trending_videos_before, fail_collection_run,
    get_collection_run, get_trending_stats, insert_trending_video, list_collection_runs,
    list_trending_dates, list_trending_videos, list_trending_with_previous_rank,
    record_collection_outcome, start_collection_run, summarize_trending_stats,
    trending_video_exists, DbError, RunCounts, TrendingListFilter,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn record(id: &str, rank: u32, bucket: NaiveDate, category: Category) -> NewTrendingRecord {
    let mut candidate = Candidate::new(id, Utc::now());
    candidate.rank = Some(rank);
    candidate.view_count = i64::from(1_000 - rank);
    candidate.category = category;
    NewTrendingRecord::from_candidate(&candidate, bucket, "KR", None).unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn collection_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let run = create_collection_run(&pool, "cli", date(1))
        .await
        .expect("create_collection_run failed");
    assert_eq!(run.status, "queued");
    assert_eq!(run.bucket_date, date(1));

    start_collection_run(&pool, run.id)
        .await
        .expect("start_collection_run failed");

    let counts = RunCounts {
        extracted: 5,
        enriched: 4,
        validated: 4,
        excluded: 1,
        created: 3,
        skipped: 1,
        failed: 0,
    };
    complete_collection_run(&pool, run.id, counts)
        .await
        .expect("complete_collection_run failed");

    let fetched = get_collection_run(&pool, run.id)
        .await
        .expect("get_collection_run failed");
    assert_eq!(fetched.status, "succeeded");
    assert!(fetched.started_at.is_some());
    assert!(fetched.completed_at.is_some());
    assert_eq!(fetched.extracted_count, 5);
    assert_eq!(fetched.created_count, 3);
    assert_eq!(fetched.skipped_count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn collection_run_lifecycle_queued_to_failed(pool: sqlx::PgPool) {
    let run = create_collection_run(&pool, "scheduler", date(1))
        .await
        .expect("create_collection_run failed");
    start_collection_run(&pool, run.id)
        .await
        .expect("start_collection_run failed");
    fail_collection_run(&pool, run.id, "initial data missing")
        .await
        .expect("fail_collection_run failed");

    let fetched = get_collection_run(&pool, run.id)
        .await
        .expect("get_collection_run failed");
    assert_eq!(fetched.status, "failed");
    assert_eq!(fetched.error_message.as_deref(), Some("initial data missing"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn collection_run_cannot_complete_directly_from_queued(pool: sqlx::PgPool) {
    let run = create_collection_run(&pool, "api", date(1))
        .await
        .expect("create_collection_run failed");

    let err = complete_collection_run(&pool, run.id, RunCounts::default())
        .await
        .expect_err("queued run must not complete");
    assert!(matches!(
        err,
        DbError::InvalidCollectionRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_collection_run_missing_is_not_found(pool: sqlx::PgPool) {
    let err = get_collection_run(&pool, 9_999)
        .await
        .expect_err("no such run");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_collection_runs_is_newest_first(pool: sqlx::PgPool) {
    let first = create_collection_run(&pool, "cli", date(1)).await.unwrap();
    let second = create_collection_run(&pool, "cli", date(2)).await.unwrap();

    let runs = list_collection_runs(&pool, 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, second.id);
    assert_eq!(runs[1].id, first.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_then_exists_and_duplicate_is_rejected(pool: sqlx::PgPool) {
    let new = record("AAAAAAAA", 1, date(1), Category::Other);
    assert!(!trending_video_exists(&pool, "AAAAAAAA", date(1)).await.unwrap());

    let row = insert_trending_video(&pool, &new).await.unwrap();
    assert_eq!(row.youtube_id, "AAAAAAAA");
    assert_eq!(row.trending_rank, 1);
    assert!(trending_video_exists(&pool, "AAAAAAAA", date(1)).await.unwrap());

    let err = insert_trending_video(&pool, &new).await.unwrap_err();
    assert!(matches!(err, DbError::Duplicate));

    // Same video on another day is a distinct snapshot.
    insert_trending_video(&pool, &record("AAAAAAAA", 4, date(2), Category::Other))
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_trending_videos_filters_music_and_orders_by_rank(pool: sqlx::PgPool) {
    insert_trending_video(&pool, &record("BBBBBBBB", 2, date(1), Category::Gaming))
        .await
        .unwrap();
    insert_trending_video(&pool, &record("AAAAAAAA", 1, date(1), Category::Music))
        .await
        .unwrap();
    insert_trending_video(&pool, &record("CCCCCCCC", 3, date(1), Category::Comedy))
        .await
        .unwrap();

    let filtered = list_trending_videos(&pool, TrendingListFilter::for_date(date(1)))
        .await
        .unwrap();
    let ids: Vec<_> = filtered.iter().map(|r| r.youtube_id.as_str()).collect();
    assert_eq!(ids, ["BBBBBBBB", "CCCCCCCC"]);

    let mut with_music = TrendingListFilter::for_date(date(1));
    with_music.exclude_music = false;
    with_music.limit = 2;
    let rows = list_trending_videos(&pool, with_music).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.youtube_id.as_str()).collect();
    assert_eq!(ids, ["AAAAAAAA", "BBBBBBBB"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn previous_rank_comes_from_latest_earlier_day_in_window(pool: sqlx::PgPool) {
    insert_trending_video(&pool, &record("AAAAAAAA", 6, date(2), Category::Other))
        .await
        .unwrap();
    insert_trending_video(&pool, &record("AAAAAAAA", 4, date(3), Category::Other))
        .await
        .unwrap();
    insert_trending_video(&pool, &record("AAAAAAAA", 1, date(5), Category::Other))
        .await
        .unwrap();
    insert_trending_video(&pool, &record("BBBBBBBB", 2, date(5), Category::Other))
        .await
        .unwrap();

    let rows = list_trending_with_previous_rank(&pool, TrendingListFilter::for_date(date(5)), 7)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].video.youtube_id, "AAAAAAAA");
    assert_eq!(rows[0].previous_rank, Some(4));
    assert_eq!(rows[0].rank_change(), Some(3));
    assert!(rows[1].is_new());

    let narrow = list_trending_with_previous_rank(&pool, TrendingListFilter::for_date(date(5)), 1)
        .await
        .unwrap();
    assert!(narrow[0].is_new());
}

#[sqlx::test(migrations = "../../migrations")]
async fn dates_and_retention_cleanup(pool: sqlx::PgPool) {
    for day in [1, 2, 3] {
        insert_trending_video(&pool, &record("AAAAAAAA", 1, date(day), Category::Other))
            .await
            .unwrap();
    }

    let dates = list_trending_dates(&pool, 10).await.unwrap();
    assert_eq!(dates, vec![date(3), date(2), date(1)]);

    assert_eq!(count_trending_videos_before(&pool, date(3)).await.unwrap(), 2);
    assert_eq!(delete_trending_videos_before(&pool, date(3)).await.unwrap(), 2);
    assert_eq!(list_trending_dates(&pool, 10).await.unwrap(), vec![date(3)]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stats_accumulate_per_date(pool: sqlx::PgPool) {
    record_collection_outcome(&pool, date(1), 4, 3, true)
        .await
        .unwrap();
    record_collection_outcome(&pool, date(1), 2, 2, true)
        .await
        .unwrap();
    record_collection_outcome(&pool, date(1), 9, 9, false)
        .await
        .unwrap();
    record_collection_outcome(&pool, date(2), 1, 1, true)
        .await
        .unwrap();

    let day_one = get_trending_stats(&pool, date(1)).await.unwrap();
    assert_eq!(day_one.total_videos_collected, 6);
    assert_eq!(day_one.shorts_collected, 5);
    assert_eq!(day_one.successful_collections, 2);
    assert_eq!(day_one.failed_collections, 1);

    let summary = summarize_trending_stats(&pool, date(1)).await.unwrap();
    assert_eq!(summary.days, 2);
    assert_eq!(summary.total_videos_collected, 7);

    assert_eq!(delete_trending_stats_before(&pool, date(2)).await.unwrap(), 1);
    assert!(matches!(
        get_trending_stats(&pool, date(1)).await,
        Err(DbError::NotFound)
    ));
}
