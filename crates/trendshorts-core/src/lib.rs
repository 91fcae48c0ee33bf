pub mod app_config;
pub mod candidate;
pub mod config;
pub mod duration;
pub mod format;
pub mod metadata;
pub mod record;

pub use app_config::{AppConfig, Environment};
pub use candidate::{
    is_valid_video_id, placeholder_title, Candidate, Category, VIDEO_ID_MAX_LEN, VIDEO_ID_MIN_LEN,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use duration::{iso_duration_from_secs, is_short_form_secs, parse_iso_duration_secs};
pub use format::{format_clock_duration, format_compact_count};
pub use metadata::VideoMetadata;
pub use record::{NewTrendingRecord, TrendingRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("candidate {external_id} has no rank assigned")]
    Unranked { external_id: String },
}
