use chrono::Utc;
use trendshorts_pipeline::{apply_retention, retention_cutoff};

/// Deletes trending records older than `days` days.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub(crate) async fn run_cleanup(
    pool: &sqlx::PgPool,
    days: u32,
    dry_run: bool,
    keep_stats: bool,
) -> anyhow::Result<()> {
    let cutoff = retention_cutoff(Utc::now().date_naive(), days);
    let report = apply_retention(pool, cutoff, keep_stats, dry_run).await?;

    if report.dry_run {
        println!(
            "dry-run: would delete {} records dated before {cutoff}",
            report.videos
        );
    } else {
        println!(
            "deleted {} records and {} stats rows dated before {cutoff}",
            report.videos, report.stats
        );
    }
    Ok(())
}
