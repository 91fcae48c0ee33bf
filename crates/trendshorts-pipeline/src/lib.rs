pub mod accumulate;
pub mod cache;
pub mod enrich;
pub mod orchestrator;
pub mod rank;
pub mod retention;
pub mod runner;
pub mod store;
pub mod validate;

pub use accumulate::{AccumulationStore, PersistReport};
pub use cache::{MetadataCache, MokaMetadataCache};
pub use enrich::{
    merge_metadata, EnrichFailure, EnrichOptions, EnrichmentReport, FetchOutcome,
    MetadataEnricher, ProviderFactory,
};
pub use orchestrator::{
    CollectionRunResult, PipelineError, PipelineOptions, PipelineOrchestrator, RunOutcome,
    RunRequest, RunStage,
};
pub use rank::{assign_ranks, sort_by_views};
pub use retention::{apply_retention, retention_cutoff, RetentionReport};
pub use runner::{
    begin_run, execute_run, fail_run_best_effort, run_counts, run_recorded, RecordedRun,
    TriggerSource,
};
pub use store::{MemoryTrendingStore, PgTrendingStore, StoreError, TrendingStore};
pub use validate::{validate, ValidationReport};
