//! HTTP client for race pages

use super::extract::{
    parse_race_page, ExtractionStrategy, KatakanaOddsStrategy, DEFAULT_BLOCK_SELECTOR,
};
use super::ScrapedRace;
use crate::error::PlanError;
use chrono::Utc;
use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

/// How much of the body is searched for a `<meta>` charset declaration
const META_SNIFF_BYTES: usize = 2048;

/// Scraper errors
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    #[error("No entrants found on page; it may need JavaScript to render")]
    NoEntrants,

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Scraper configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Elements scanned for entrant text
    pub block_selector: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            block_selector: DEFAULT_BLOCK_SELECTOR.to_string(),
        }
    }
}

/// Check that the input is an absolute http(s) URL
pub fn validate_url(raw: &str) -> Result<Url, ScraperError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PlanError::EmptyInput.into());
    }

    let url = Url::parse(raw).map_err(|e| ScraperError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ScraperError::InvalidUrl(format!(
            "unsupported scheme {:?} in {}",
            scheme, raw
        ))),
    }
}

/// Charset label from a `Content-Type` header value
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let label = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
            Encoding::for_label(label.as_bytes())
        } else {
            None
        }
    })
}

/// Charset declared by `<meta charset>` or `<meta http-equiv>` near the top of the page
fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(META_SNIFF_BYTES)]);
    let pattern = Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_\-]+)"#).ok()?;
    let caps = pattern.captures(&head)?;
    Encoding::for_label(caps[1].as_bytes())
}

/// Decode a response body
///
/// Order: header charset, meta charset, valid UTF-8, then the first of
/// Shift_JIS and EUC-JP that decodes cleanly.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes));

    if let Some(encoding) = declared {
        tracing::debug!("Decoding body as {}", encoding.name());
        let (decoded, _, _) = encoding.decode(bytes);
        return decoded.into_owned();
    }

    for encoding in [UTF_8, SHIFT_JIS, EUC_JP] {
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            tracing::debug!("Detected body encoding {}", encoding.name());
            return decoded.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

/// Race page scraper
///
/// One GET per call, no retries.
pub struct RaceScraper {
    client: reqwest::Client,
    config: ScraperConfig,
    strategy: Box<dyn ExtractionStrategy + Send + Sync>,
}

impl RaceScraper {
    /// Create a new scraper with the given configuration
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            strategy: Box::new(KatakanaOddsStrategy::default()),
        })
    }

    /// Replace the entrant extraction strategy
    pub fn with_strategy(
        mut self,
        strategy: impl ExtractionStrategy + Send + Sync + 'static,
    ) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Fetch a page and decode it to text
    async fn fetch_page(&self, url: &Url) -> Result<String, ScraperError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok(decode_body(&bytes, content_type.as_deref()))
    }

    /// Fetch a race page and extract its entrants
    pub async fn scrape(&self, url: &str) -> Result<ScrapedRace, ScraperError> {
        let url = validate_url(url)?;
        tracing::info!("Scraping race page: {}", url);

        let html = self.fetch_page(&url).await?;
        let entrants =
            parse_race_page(&html, &self.config.block_selector, self.strategy.as_ref())?;
        tracing::info!("Found {} entrants", entrants.len());

        Ok(ScrapedRace {
            url: url.to_string(),
            scraped_at: Utc::now().to_rfc3339(),
            entrants,
        })
    }
}
