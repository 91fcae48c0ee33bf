//! Read-only `report` and `runs` commands.

use chrono::NaiveDate;
use trendshorts_core::{format_clock_duration, format_compact_count};
use trendshorts_db::{CollectionRunRow, RankedTrendingRow, TrendingListFilter};

use crate::collect::truncate_title;

/// Prints the ranked list for `date` (latest collected date when `None`).
///
/// # Errors
///
/// Returns an error if a database query fails.
pub(crate) async fn run_report(
    pool: &sqlx::PgPool,
    date: Option<NaiveDate>,
    limit: i64,
    include_music: bool,
    lookback_days: i32,
) -> anyhow::Result<()> {
    let date = match date {
        Some(date) => date,
        None => {
            let Some(latest) = trendshorts_db::list_trending_dates(pool, 1)
                .await?
                .into_iter()
                .next()
            else {
                println!("no trending records yet; run `collect` first");
                return Ok(());
            };
            latest
        }
    };

    let filter = TrendingListFilter {
        limit,
        exclude_music: !include_music,
        ..TrendingListFilter::for_date(date)
    };
    let rows =
        trendshorts_db::list_trending_with_previous_rank(pool, filter, lookback_days).await?;

    if rows.is_empty() {
        println!("no trending records for {date}");
        return Ok(());
    }

    println!("Trending shorts for {date}");
    println!();
    println!(
        "{:<6}{:<7}{:>9}{:>8}  {:<22}TITLE",
        "RANK", "MOVE", "VIEWS", "LENGTH", "CHANNEL"
    );
    for row in &rows {
        println!(
            "{:<6}{:<7}{:>9}{:>8}  {:<22}{}",
            row.video.trending_rank,
            rank_marker(row),
            format_compact_count(row.video.view_count),
            format_clock_duration(&row.video.duration),
            truncate_title(&row.video.channel_title, 20),
            truncate_title(&row.video.title, 50)
        );
    }

    Ok(())
}

/// `NEW`, `▲n`, `▼n` or `=` relative to the previous appearance.
pub(crate) fn rank_marker(row: &RankedTrendingRow) -> String {
    match row.rank_change() {
        None => "NEW".to_owned(),
        Some(0) => "=".to_owned(),
        Some(up) if up > 0 => format!("\u{25b2}{up}"),
        Some(down) => format!("\u{25bc}{}", down.unsigned_abs()),
    }
}

/// Prints the most recent collection runs.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = trendshorts_db::list_collection_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no collection runs recorded yet");
        return Ok(());
    }

    println!(
        "{:<7}{:<11}{:<12}{:<12}{:>8}{:>8}{:>8}  STARTED",
        "ID", "TRIGGER", "STATUS", "BUCKET", "FOUND", "NEW", "SKIP"
    );
    for run in &runs {
        println!(
            "{:<7}{:<11}{:<12}{:<12}{:>8}{:>8}{:>8}  {}",
            run.id,
            run.trigger_source,
            run.status,
            run.bucket_date,
            run.extracted_count,
            run.created_count,
            run.skipped_count,
            fmt_started(run)
        );
        if let Some(message) = &run.error_message {
            println!("       error: {message}");
        }
    }

    Ok(())
}

fn fmt_started(run: &CollectionRunRow) -> String {
    run.started_at.map_or_else(
        || "\u{2014}".to_string(),
        |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}
