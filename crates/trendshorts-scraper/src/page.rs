//! Page render capability: fetch the trending page that carries the
//! embedded initial-data blob.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use trendshorts_core::AppConfig;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// Returns the rendered payload for `url`: an HTML document with the
/// initial-data blob inlined, or the JSON blob itself.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, ScraperError>;
}

/// Plain HTTP renderer. The trending page inlines its data blob in the
/// server-rendered markup, so no script execution is needed.
///
/// Transient errors (429, network failures) are retried with exponential
/// backoff up to `max_retries` additional attempts.
pub struct TrendingPageClient {
    client: Client,
    accept_language: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl TrendingPageClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        region_code: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            accept_language: accept_language_for(region_code),
            max_retries,
            backoff_base_secs,
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            &config.region_code,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_secs,
        )
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.accept_language)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: domain_of(url),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageRenderer for TrendingPageClient {
    async fn render(&self, url: &str) -> Result<String, ScraperError> {
        tracing::debug!(url, "fetching trending page");
        let body = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch_once(url)
        })
        .await?;
        tracing::debug!(url, bytes = body.len(), "trending page fetched");
        Ok(body)
    }
}

fn accept_language_for(region_code: &str) -> String {
    let language = match region_code {
        "KR" => "ko",
        "JP" => "ja",
        "DE" | "AT" => "de",
        "FR" => "fr",
        "ES" | "MX" => "es",
        "BR" | "PT" => "pt",
        _ => "en",
    };
    if language == "en" {
        "en-US,en;q=0.9".to_owned()
    } else {
        format!("{language}-{region_code},{language};q=0.9,en;q=0.8")
    }
}

fn domain_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_language_follows_region() {
        assert_eq!(accept_language_for("KR"), "ko-KR,ko;q=0.9,en;q=0.8");
        assert_eq!(accept_language_for("US"), "en-US,en;q=0.9");
        assert_eq!(accept_language_for("ZZ"), "en-US,en;q=0.9");
    }

    #[test]
    fn domain_of_extracts_host() {
        assert_eq!(
            domain_of("https://www.youtube.com/feed/trending"),
            "www.youtube.com"
        );
        assert_eq!(domain_of("not a url"), "not a url");
    }
}
