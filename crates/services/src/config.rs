use std::env;
use std::time::Duration;

use quiz_core::model::ScoringPolicy;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_SOURCE_URL: &str = "https://api.jsonserve.com/Uw5CrX";
pub const DEFAULT_PROXY_URL: &str = "https://api.allorigins.win/get";
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1000);

/// Where questions come from and how a session paces itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    pub source_url: Url,
    /// CORS-style relay that wraps the source document in `{"contents": "..."}`.
    pub proxy_url: Option<Url>,
    pub advance_delay: Duration,
    pub scoring: ScoringPolicy,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            source_url: Url::parse(DEFAULT_SOURCE_URL).expect("default source url is valid"),
            proxy_url: Some(Url::parse(DEFAULT_PROXY_URL).expect("default proxy url is valid")),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl QuizConfig {
    /// Read `QUIZ_SOURCE_URL`, `QUIZ_PROXY_URL`, `QUIZ_ADVANCE_DELAY_MS` and
    /// `QUIZ_SCORING`, falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("QUIZ_SOURCE_URL") {
            config.source_url = parse_url("source", &raw)?;
        }
        if let Ok(raw) = env::var("QUIZ_PROXY_URL") {
            config.proxy_url = parse_proxy(&raw)?;
        }
        if let Ok(raw) = env::var("QUIZ_ADVANCE_DELAY_MS") {
            config.advance_delay = parse_delay(&raw)?;
        }
        if let Ok(raw) = env::var("QUIZ_SCORING") {
            config.scoring = parse_scoring(&raw)?;
        }
        Ok(config)
    }

    /// The URL actually requested: the proxy with `?url=<source>`, or the
    /// source itself when no proxy is configured.
    #[must_use]
    pub fn request_url(&self) -> Url {
        match &self.proxy_url {
            Some(proxy) => {
                let mut url = proxy.clone();
                url.query_pairs_mut()
                    .append_pair("url", self.source_url.as_str());
                url
            }
            None => self.source_url.clone(),
        }
    }
}

/// Parse a source or proxy URL.
///
/// # Errors
///
/// Returns `ConfigError::InvalidUrl` if `raw` is not an absolute URL.
pub fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        name,
        raw: raw.to_string(),
        source,
    })
}

/// Parse a proxy setting; empty or `none` disables the proxy.
///
/// # Errors
///
/// Returns `ConfigError::InvalidUrl` for anything else that is not a URL.
pub fn parse_proxy(raw: &str) -> Result<Option<Url>, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_url("proxy", trimmed).map(Some)
}

/// Parse a delay given in milliseconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidDelay` if `raw` is not a non-negative integer.
pub fn parse_delay(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidDelay {
            raw: raw.to_string(),
        })
}

/// Parse a scoring policy name.
///
/// # Errors
///
/// Returns `ConfigError::InvalidScoring` for unknown names.
pub fn parse_scoring(raw: &str) -> Result<ScoringPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "per-submission" => Ok(ScoringPolicy::PerSubmission),
        "first-correct" => Ok(ScoringPolicy::FirstCorrectOnly),
        _ => Err(ConfigError::InvalidScoring {
            raw: raw.to_string(),
        }),
    }
}
