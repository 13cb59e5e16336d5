//! Resolver configuration
//!
//! Everything is read from the environment (a `.env` file is loaded by the
//! binary). Missing API keys are tolerated: the affected client reports a
//! configuration error per call, which the pipeline treats as "no result".

use crate::error::TickerError;
use crate::Result;
use tracing::warn;

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DEEPSEEK_API_BASE: &str = "https://api.deepseek.com/v1";
const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Settings for one chat-completion provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Short name used in logs and traces
    pub name: String,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    /// Ask the server to enforce a JSON object response
    pub json_mode: bool,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// OpenAI chat completions; relies on the prompt alone for JSON output
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            name: "openai".to_string(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            json_mode: false,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// DeepSeek's OpenAI-compatible endpoint with server-side JSON mode
    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self {
            name: "deepseek".to_string(),
            api_base: DEFAULT_DEEPSEEK_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_DEEPSEEK_MODEL.to_string(),
            json_mode: true,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Settings for the market search provider (Financial Modeling Prep)
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub api_key: String,
    /// Maximum number of search results requested
    pub limit: u32,
    pub timeout_secs: u64,
}

impl MarketDataConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_FMP_BASE_URL.to_string(),
            api_key: api_key.into(),
            limit: DEFAULT_SEARCH_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// First strategy in the chain
    pub primary: ProviderConfig,
    /// Last language-model strategy, tried after market search
    pub fallback: ProviderConfig,
    pub market: MarketDataConfig,
    /// Append regex matching as a final strategy
    pub direct_match_fallback: bool,
}

impl ResolverConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout_secs = match var("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                TickerError::ConfigError(format!("HTTP_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let direct_match_fallback = match var("TICKER_DIRECT_MATCH_FALLBACK") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                TickerError::ConfigError(format!(
                    "TICKER_DIRECT_MATCH_FALLBACK must be true or false, got '{}'",
                    raw
                ))
            })?,
            None => false,
        };

        let api_key = |key: &str| {
            var(key).unwrap_or_else(|| {
                warn!("{} not set; that provider will return no results", key);
                String::new()
            })
        };

        let mut primary = ProviderConfig::openai(api_key("OPENAI_API_KEY")).with_timeout(timeout_secs);
        if let Some(base) = var("OPENAI_API_BASE") {
            primary = primary.with_api_base(base);
        }
        if let Some(model) = var("OPENAI_MODEL") {
            primary = primary.with_model(model);
        }

        let mut fallback =
            ProviderConfig::deepseek(api_key("DEEPSEEK_API_KEY")).with_timeout(timeout_secs);
        if let Some(base) = var("DEEPSEEK_API_BASE") {
            fallback = fallback.with_api_base(base);
        }
        if let Some(model) = var("DEEPSEEK_MODEL") {
            fallback = fallback.with_model(model);
        }

        let mut market = MarketDataConfig::new(api_key("FMP_API_KEY"));
        market.timeout_secs = timeout_secs;
        if let Some(base) = var("FMP_BASE_URL") {
            market = market.with_base_url(base);
        }

        Ok(Self {
            primary,
            fallback,
            market,
            direct_match_fallback,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
