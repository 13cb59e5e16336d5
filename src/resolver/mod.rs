//! Ticker resolution orchestrator
//!
//! PRIMARY LLM → MARKET SEARCH → FALLBACK LLM → (DIRECT MATCH) → EMPTY
//!
//! Strategies run one after another; the first non-empty answer wins.
//! A failing strategy is logged and counts as empty, so resolution itself
//! never fails.

use crate::config::ResolverConfig;
use crate::llm::{ChatCompletionClient, LlmExtractor};
use crate::market::{FmpClient, MarketSearchResolver};
use crate::matcher::DirectPatternMatcher;
use crate::models::{ExtractedTicker, TickerQuery};
use crate::splitter::QuerySplitter;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Anything that can turn a query into tickers
#[async_trait]
pub trait TickerSource: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self, query: &TickerQuery) -> Result<Vec<ExtractedTicker>>;
}

/// Position of a source in the fallback chain
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    LanguageModel,
    MarketSearch,
    FallbackLanguageModel,
    DirectMatch,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::LanguageModel => "language model",
            Strategy::MarketSearch => "market search",
            Strategy::FallbackLanguageModel => "fallback language model",
            Strategy::DirectMatch => "direct match",
        };
        f.write_str(label)
    }
}

/// Outcome of one resolution, with the trace of what was tried
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub request_id: Uuid,
    pub tickers: Vec<ExtractedTicker>,
    /// Strategy that produced `tickers`; `None` when nothing was found
    pub strategy: Option<Strategy>,
    pub trace: Vec<String>,
    pub elapsed_ms: u64,
}

/// Main resolver that runs the strategy chain
pub struct TickerResolver {
    primary: Arc<dyn TickerSource>,
    market: Arc<dyn TickerSource>,
    fallback: Arc<dyn TickerSource>,
    direct_match: Option<Arc<dyn TickerSource>>,
}

impl TickerResolver {
    pub fn new(
        primary: Arc<dyn TickerSource>,
        market: Arc<dyn TickerSource>,
        fallback: Arc<dyn TickerSource>,
    ) -> Self {
        Self {
            primary,
            market,
            fallback,
            direct_match: None,
        }
    }

    /// Wire the production providers described by `config`
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let primary = LlmExtractor::new(Arc::new(ChatCompletionClient::new(
            config.primary.clone(),
        )?));
        let fallback = LlmExtractor::new(Arc::new(ChatCompletionClient::new(
            config.fallback.clone(),
        )?));
        let market = MarketSearchResolver::new(Arc::new(FmpClient::new(&config.market)?));

        Ok(Self::new(Arc::new(primary), Arc::new(market), Arc::new(fallback))
            .with_direct_match_fallback(config.direct_match_fallback))
    }

    /// Try regex matching on the query text after every other strategy
    pub fn with_direct_match_fallback(mut self, enabled: bool) -> Self {
        self.direct_match = enabled.then(|| Arc::new(DirectPatternMatcher) as Arc<dyn TickerSource>);
        self
    }

    /// Resolve a query to tickers. An empty list means nothing was found.
    pub async fn resolve(&self, query: &TickerQuery) -> Vec<ExtractedTicker> {
        self.resolve_detailed(query).await.tickers
    }

    /// Resolve a query and report which strategy answered
    pub async fn resolve_detailed(&self, query: &TickerQuery) -> Resolution {
        let start_time = Instant::now();
        let request_id = Uuid::new_v4();
        let mut trace = Vec::new();

        info!(
            request_id = %request_id,
            query = %query.content,
            region = %query.geography,
            language = %query.language,
            "Resolver: processing query"
        );

        if query.is_blank() {
            trace.push("INPUT: blank query, nothing to resolve".to_string());
            return Resolution {
                request_id,
                tickers: Vec::new(),
                strategy: None,
                trace,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            };
        }

        let query_type = if QuerySplitter::is_comparison(&query.content) {
            "comparison"
        } else {
            "single"
        };
        debug!(query_type, "Query type");
        trace.push(format!("INPUT: {} query", query_type));

        let mut stages: Vec<(Strategy, &Arc<dyn TickerSource>)> = vec![
            (Strategy::LanguageModel, &self.primary),
            (Strategy::MarketSearch, &self.market),
            (Strategy::FallbackLanguageModel, &self.fallback),
        ];
        if let Some(direct_match) = &self.direct_match {
            stages.push((Strategy::DirectMatch, direct_match));
        }

        for (strategy, source) in stages {
            let tickers = match source.extract(query).await {
                Ok(tickers) => tickers,
                Err(e) => {
                    warn!(
                        request_id = %request_id,
                        %strategy,
                        source = %source.name(),
                        error = %e,
                        "Strategy failed"
                    );
                    trace.push(format!("{}: {} failed ({})", strategy, source.name(), e));
                    continue;
                }
            };

            if tickers.is_empty() {
                debug!(%strategy, source = %source.name(), "Strategy found nothing");
                trace.push(format!("{}: {} found nothing", strategy, source.name()));
                continue;
            }

            info!(
                request_id = %request_id,
                %strategy,
                source = %source.name(),
                count = tickers.len(),
                "Resolved tickers"
            );
            trace.push(format!(
                "{}: {} found {}",
                strategy,
                source.name(),
                tickers
                    .iter()
                    .map(|t| t.symbol.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));

            return Resolution {
                request_id,
                tickers,
                strategy: Some(strategy),
                trace,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            };
        }

        info!(request_id = %request_id, "All strategies failed to find tickers");
        trace.push("COMPLETE: no tickers identified".to_string());

        Resolution {
            request_id,
            tickers: Vec::new(),
            strategy: None,
            trace,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TickerError;
    use crate::llm::tests::StubBackend;
    use crate::market::tests::{stock, StubSearch};
    use crate::models::{Geography, Language};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source with a fixed answer that counts how often it was asked
    struct FixedSource {
        name: &'static str,
        answer: Option<Vec<&'static str>>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn returning(name: &'static str, symbols: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Some(symbols),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TickerSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn extract(&self, _query: &TickerQuery) -> Result<Vec<ExtractedTicker>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Some(symbols) => Ok(symbols.iter().map(|s| ExtractedTicker::new(*s)).collect()),
                None => Err(TickerError::LlmError("503 Service Unavailable".to_string())),
            }
        }
    }

    fn symbols(tickers: &[ExtractedTicker]) -> Vec<&str> {
        tickers.iter().map(|t| t.symbol.as_str()).collect()
    }

    fn us_query(text: &str) -> TickerQuery {
        TickerQuery::new(text, Geography::UnitedStates, Language::English)
    }

    #[tokio::test]
    async fn test_primary_wins_without_validation() {
        let primary = FixedSource::returning("openai", vec!["AAPL"]);
        let market = FixedSource::returning("market", vec!["APLE"]);
        let fallback = FixedSource::returning("deepseek", vec!["AAPL.MX"]);

        let resolver = TickerResolver::new(primary.clone(), market.clone(), fallback.clone());
        let resolution = resolver
            .resolve_detailed(&us_query("Find me Apple stock price"))
            .await;

        assert_eq!(symbols(&resolution.tickers), vec!["AAPL"]);
        assert_eq!(resolution.strategy, Some(Strategy::LanguageModel));
        assert_eq!(market.calls(), 0);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_market_search_after_empty_primary() {
        let primary = Arc::new(LlmExtractor::new(Arc::new(StubBackend::replying("openai", "[]"))));
        let search = Arc::new(StubSearch::default().with(
            "Find me Apple stock price",
            vec![stock("AAPL", "NASDAQ", "NASDAQ Global Select")],
        ));
        let market = Arc::new(MarketSearchResolver::new(search.clone()));
        let fallback = FixedSource::returning("deepseek", vec!["MSFT"]);

        let resolver = TickerResolver::new(primary, market, fallback.clone());
        let resolution = resolver
            .resolve_detailed(&us_query("Find me Apple stock price"))
            .await;

        assert_eq!(search.calls(), vec!["Find me Apple stock price"]);
        assert_eq!(symbols(&resolution.tickers), vec!["AAPL"]);
        assert_eq!(resolution.strategy, Some(Strategy::MarketSearch));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_model_is_last_resort() {
        let primary = FixedSource::failing("openai");
        let market = FixedSource::returning("market", vec![]);
        let fallback = FixedSource::returning("deepseek", vec!["600519.SS"]);

        let resolver = TickerResolver::new(primary.clone(), market.clone(), fallback.clone());
        let resolution = resolver.resolve_detailed(&us_query("贵州茅台")).await;

        assert_eq!(symbols(&resolution.tickers), vec!["600519.SS"]);
        assert_eq!(resolution.strategy, Some(Strategy::FallbackLanguageModel));
        assert_eq!(
            (primary.calls(), market.calls(), fallback.calls()),
            (1, 1, 1)
        );
        assert_eq!(resolution.trace.len(), 4);
    }

    #[tokio::test]
    async fn test_hk_query_filters_before_fallback() {
        let query = TickerQuery::new(
            "港股阿里巴巴上升趨勢",
            Geography::Global,
            Language::TraditionalChinese,
        );
        let primary = Arc::new(LlmExtractor::new(Arc::new(StubBackend::failing("openai"))));
        let search = Arc::new(StubSearch::default().with(
            "港股阿里巴巴上升趨勢",
            vec![
                stock("BABA", "NYSE", "New York Stock Exchange"),
                stock("9988.HK", "HKSE", "HKSE"),
            ],
        ));
        let market = Arc::new(MarketSearchResolver::new(search));
        let fallback = FixedSource::returning("deepseek", vec!["BABA"]);

        let resolver = TickerResolver::new(primary, market, fallback);
        let tickers = resolver.resolve(&query).await;

        assert_eq!(symbols(&tickers), vec!["9988.HK"]);
    }

    #[tokio::test]
    async fn test_everything_failing_returns_empty() {
        let primary = Arc::new(LlmExtractor::new(Arc::new(StubBackend::failing("openai"))));
        let market = Arc::new(MarketSearchResolver::new(Arc::new(StubSearch::failing())));
        let fallback = Arc::new(LlmExtractor::new(Arc::new(StubBackend::replying(
            "deepseek",
            "not json at all",
        ))));

        let resolver = TickerResolver::new(primary, market, fallback);
        let resolution = resolver
            .resolve_detailed(&us_query("Compare AAPL and Tesla"))
            .await;

        assert!(resolution.tickers.is_empty());
        assert_eq!(resolution.strategy, None);
    }

    #[tokio::test]
    async fn test_stage_errors_are_contained() {
        let resolver = TickerResolver::new(
            FixedSource::failing("openai"),
            FixedSource::failing("market"),
            FixedSource::failing("deepseek"),
        );

        assert!(resolver.resolve(&us_query("Apple")).await.is_empty());
    }

    #[tokio::test]
    async fn test_direct_match_is_opt_in() {
        let query = us_query("thoughts on NVDA and 1810.HK");

        let default_chain = TickerResolver::new(
            FixedSource::returning("openai", vec![]),
            FixedSource::returning("market", vec![]),
            FixedSource::returning("deepseek", vec![]),
        );
        assert!(default_chain.resolve(&query).await.is_empty());

        let with_direct = TickerResolver::new(
            FixedSource::returning("openai", vec![]),
            FixedSource::returning("market", vec![]),
            FixedSource::returning("deepseek", vec![]),
        )
        .with_direct_match_fallback(true);

        let resolution = with_direct.resolve_detailed(&query).await;
        assert_eq!(symbols(&resolution.tickers), vec!["NVDA", "1810.HK"]);
        assert_eq!(resolution.strategy, Some(Strategy::DirectMatch));
    }

    #[tokio::test]
    async fn test_blank_query_skips_providers() {
        let primary = FixedSource::returning("openai", vec!["AAPL"]);
        let resolver = TickerResolver::new(
            primary.clone(),
            FixedSource::returning("market", vec![]),
            FixedSource::returning("deepseek", vec![]),
        );

        assert!(resolver.resolve(&us_query("   ")).await.is_empty());
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolution_is_repeatable() {
        let search = Arc::new(
            StubSearch::default()
                .with("AAPL", vec![stock("AAPL", "NASDAQ", "NASDAQ")])
                .with("Tencent", vec![stock("0700.HK", "HKSE", "HKSE"), stock("TCEHY", "OTC", "Other OTC")]),
        );
        let resolver = TickerResolver::new(
            Arc::new(LlmExtractor::new(Arc::new(StubBackend::replying("openai", "[]")))),
            Arc::new(MarketSearchResolver::new(search)),
            FixedSource::returning("deepseek", vec![]),
        );
        let query = TickerQuery::new("Compare AAPL and Tencent", Geography::Global, Language::English);

        let first = resolver.resolve(&query).await;
        let second = resolver.resolve(&query).await;

        assert_eq!(symbols(&first), vec!["AAPL", "TCEHY"]);
        assert_eq!(first, second);
    }
}
