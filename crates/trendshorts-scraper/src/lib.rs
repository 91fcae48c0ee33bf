pub mod error;
pub mod extract;
pub mod initial_data;
pub mod page;
pub mod provider;
pub(crate) mod rate_limit;
pub mod ytdlp;

pub use error::{ProviderError, ScraperError};
pub use extract::{CandidateExtractor, DEFAULT_MAX_DEPTH};
pub use initial_data::extract_initial_data;
pub use page::{PageRenderer, TrendingPageClient};
pub use provider::MetadataProvider;
pub use ytdlp::{parse_ytdlp_json, YtDlpProvider};
