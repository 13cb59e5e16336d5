//! Language-model ticker extraction
//!
//! One extractor type, configured per provider. The provider only has to
//! turn a system prompt and a user turn into completion text; prompt
//! construction and response parsing live here.

use crate::error::TickerError;
use crate::models::{dedup_by_symbol, ExtractedTicker, Geography, Language, TickerQuery};
use crate::resolver::TickerSource;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod client;
pub mod prompt;

pub use client::ChatCompletionClient;
pub use prompt::build_system_prompt;

/// Trait for chat-style completion endpoints
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name for logs
    fn provider(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String>;
}

/// Extracts tickers by asking a language model
pub struct LlmExtractor {
    backend: Arc<dyn CompletionBackend>,
}

impl LlmExtractor {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn provider(&self) -> &str {
        self.backend.provider()
    }

    /// Ask the model for the tickers in `query`.
    ///
    /// Transport and parse failures are logged and come back as an empty list.
    pub async fn extract(
        &self,
        query: &str,
        geography: Geography,
        language: Language,
    ) -> Vec<ExtractedTicker> {
        let system_prompt = build_system_prompt(geography, language);

        let completion = match self.backend.complete(&system_prompt, query).await {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = %self.provider(), error = %e, "LLM call failed");
                return Vec::new();
            }
        };

        debug!(provider = %self.provider(), completion = %completion, "LLM completion received");

        match parse_ticker_response(&completion) {
            Ok(tickers) => {
                info!(provider = %self.provider(), count = tickers.len(), "LLM extraction complete");
                tickers
            }
            Err(e) => {
                warn!(provider = %self.provider(), error = %e, "Could not parse LLM response");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl TickerSource for LlmExtractor {
    fn name(&self) -> &str {
        self.provider()
    }

    async fn extract(&self, query: &TickerQuery) -> Result<Vec<ExtractedTicker>> {
        Ok(LlmExtractor::extract(self, &query.content, query.geography, query.language).await)
    }
}

/// Parse completion text into tickers.
///
/// Accepts a bare array, an array inside a markdown fence, an object
/// wrapping the array (JSON-mode providers must answer with an object,
/// a `tickers` key is preferred), or a single `{"symbol": ...}` object.
/// Items that do not fit the ticker shape are skipped; the response is
/// rejected only when none of a non-empty array fits.
pub fn parse_ticker_response(raw: &str) -> Result<Vec<ExtractedTicker>> {
    // Remove markdown code blocks if present
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: Value = serde_json::from_str(cleaned)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("symbol") => vec![Value::Object(map)],
        Value::Object(mut map) => match map.remove("tickers") {
            Some(Value::Array(items)) => items,
            _ => map
                .into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| {
                    TickerError::MalformedResponse(format!("no ticker array in {}", cleaned))
                })?,
        },
        other => {
            return Err(TickerError::MalformedResponse(format!(
                "expected a JSON array, got {}",
                other
            )))
        }
    };

    let total = items.len();
    let parsed: Vec<ExtractedTicker> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ExtractedTicker>(item) {
            Ok(ticker) => Some(ticker),
            Err(e) => {
                debug!(error = %e, "Skipping malformed ticker item");
                None
            }
        })
        .collect();

    if total > 0 && parsed.is_empty() {
        return Err(TickerError::MalformedResponse(format!(
            "no item has a ticker symbol in {}",
            cleaned
        )));
    }

    let tickers = parsed
        .into_iter()
        .filter_map(|mut ticker| {
            ticker.symbol = ticker.symbol.trim().to_string();
            (!ticker.symbol.is_empty()).then_some(ticker)
        })
        .collect();

    Ok(dedup_by_symbol(tickers))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend replaying a fixed completion (or failure) and recording prompts
    pub(crate) struct StubBackend {
        name: &'static str,
        reply: Option<String>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl StubBackend {
        pub(crate) fn replying(name: &'static str, reply: &str) -> Self {
            Self {
                name,
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(name: &'static str) -> Self {
            Self {
                name,
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn prompts(&self) -> Vec<(String, String)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        fn provider(&self) -> &str {
            self.name
        }

        async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_content.to_string()));
            self.reply
                .clone()
                .ok_or_else(|| TickerError::LlmError("429 Too Many Requests".to_string()))
        }
    }

    fn symbols(tickers: &[ExtractedTicker]) -> Vec<&str> {
        tickers.iter().map(|t| t.symbol.as_str()).collect()
    }

    #[test]
    fn test_parse_plain_array() {
        let tickers = parse_ticker_response(r#"[{"symbol": "AAPL"}, {"symbol": "0700.HK", "name": "Tencent"}]"#).unwrap();
        assert_eq!(symbols(&tickers), vec!["AAPL", "0700.HK"]);
        assert_eq!(tickers[1].name.as_deref(), Some("Tencent"));
    }

    #[test]
    fn test_parse_fenced_array() {
        let raw = "```json\n[{\"symbol\": \"600519.SS\"}]\n```";
        assert_eq!(symbols(&parse_ticker_response(raw).unwrap()), vec!["600519.SS"]);
    }

    #[test]
    fn test_parse_json_mode_object() {
        let wrapped = parse_ticker_response(r#"{"tickers": [{"symbol": "9988.HK"}]}"#).unwrap();
        assert_eq!(symbols(&wrapped), vec!["9988.HK"]);

        let single = parse_ticker_response(r#"{"symbol": "TSLA"}"#).unwrap();
        assert_eq!(symbols(&single), vec!["TSLA"]);

        let empty = parse_ticker_response(r#"{"tickers": []}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_parse_cleans_symbols() {
        let tickers =
            parse_ticker_response(r#"[{"symbol": " AAPL "}, {"symbol": ""}, {"symbol": "AAPL"}]"#)
                .unwrap();
        assert_eq!(symbols(&tickers), vec!["AAPL"]);
    }

    #[test]
    fn test_parse_skips_malformed_items() {
        let tickers = parse_ticker_response(
            r#"[{"symbol": "AAPL"}, {"symbol": null}, {"ticker": "MSFT"}, {"symbol": "NVDA"}]"#,
        )
        .unwrap();
        assert_eq!(symbols(&tickers), vec!["AAPL", "NVDA"]);
    }

    #[test]
    fn test_parse_prefers_tickers_key() {
        let tickers = parse_ticker_response(
            r#"{"alternatives": [{"symbol": "BABA"}], "tickers": [{"symbol": "9988.HK"}]}"#,
        )
        .unwrap();
        assert_eq!(symbols(&tickers), vec!["9988.HK"]);
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_ticker_response("The ticker for Apple is AAPL.").is_err());
        assert!(parse_ticker_response(r#"{"answer": "AAPL"}"#).is_err());
        assert!(parse_ticker_response(r#"[{"ticker": "AAPL"}]"#).is_err());
        assert!(parse_ticker_response("42").is_err());
    }

    #[tokio::test]
    async fn test_extract_sends_prompt_and_query() {
        let backend = Arc::new(StubBackend::replying("openai", r#"[{"symbol": "AAPL"}]"#));
        let extractor = LlmExtractor::new(backend.clone());

        let tickers = extractor
            .extract("Find me Apple stock price", Geography::UnitedStates, Language::English)
            .await;

        assert_eq!(symbols(&tickers), vec!["AAPL"]);

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("NYSE, NASDAQ, AMEX, OTC, CBOE"));
        assert_eq!(prompts[0].1, "Find me Apple stock price");
    }

    #[tokio::test]
    async fn test_extract_swallows_failures() {
        let failing = LlmExtractor::new(Arc::new(StubBackend::failing("deepseek")));
        assert!(failing
            .extract("Apple", Geography::Global, Language::English)
            .await
            .is_empty());

        let rambling = LlmExtractor::new(Arc::new(StubBackend::replying(
            "openai",
            "Sure! Apple trades as AAPL.",
        )));
        assert!(rambling
            .extract("Apple", Geography::Global, Language::English)
            .await
            .is_empty());
    }
}
