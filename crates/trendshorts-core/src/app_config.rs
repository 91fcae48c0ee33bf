use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Page whose embedded data blob is scanned for short-form entries.
    pub trending_url: String,
    /// Two-letter region stamped on every persisted record.
    pub region_code: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    /// Recursion cap for the JSON tree walk.
    pub extract_max_depth: usize,
    pub ytdlp_bin: String,
    pub metadata_timeout_secs: u64,
    pub enrich_parallel: bool,
    pub enrich_workers: usize,
    pub enrich_sequential_delay_ms: u64,
    pub metadata_cache_ttl_secs: u64,
    pub metadata_cache_capacity: u64,
    pub collect_max_candidates: usize,
    pub collect_cron: String,
    pub retention_days: u32,
    pub retention_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("trending_url", &self.trending_url)
            .field("region_code", &self.region_code)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field("extract_max_depth", &self.extract_max_depth)
            .field("ytdlp_bin", &self.ytdlp_bin)
            .field("metadata_timeout_secs", &self.metadata_timeout_secs)
            .field("enrich_parallel", &self.enrich_parallel)
            .field("enrich_workers", &self.enrich_workers)
            .field(
                "enrich_sequential_delay_ms",
                &self.enrich_sequential_delay_ms,
            )
            .field("metadata_cache_ttl_secs", &self.metadata_cache_ttl_secs)
            .field("metadata_cache_capacity", &self.metadata_cache_capacity)
            .field("collect_max_candidates", &self.collect_max_candidates)
            .field("collect_cron", &self.collect_cron)
            .field("retention_days", &self.retention_days)
            .field("retention_cron", &self.retention_cron)
            .finish()
    }
}
