//! Market search resolution
//!
//! Resolves tickers by searching a financial-data provider for names or
//! symbols, then narrowing candidates to the exchanges of a region.
//! Comparison queries are searched part by part.

use crate::classifier::GeographyClassifier;
use crate::models::{dedup_by_symbol, CandidateStock, ExtractedTicker, Geography, TickerQuery};
use crate::resolver::TickerSource;
use crate::splitter::QuerySplitter;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod fmp;
pub use fmp::FmpClient;

/// Free-text stock search provided by a market data service
#[async_trait]
pub trait SymbolSearch: Send + Sync {
    async fn search(&self, fragment: &str) -> Result<Vec<CandidateStock>>;
}

/// Keep only candidates listed on one of `region`'s exchanges.
///
/// `Global` keeps everything. For any other region a candidate without
/// exchange information is dropped.
pub fn filter_by_region(candidates: &[CandidateStock], region: Geography) -> Vec<CandidateStock> {
    if region.is_global() {
        return candidates.to_vec();
    }

    let codes = region.exchange_codes();

    candidates
        .iter()
        .filter(|stock| {
            if !stock.has_exchange_info() {
                return false;
            }

            codes.iter().any(|code| {
                stock.exchange_short_name.as_deref() == Some(*code)
                    || stock
                        .exchange
                        .as_deref()
                        .is_some_and(|exchange| exchange.contains(*code))
            })
        })
        .cloned()
        .collect()
}

/// Resolves queries against a [`SymbolSearch`] backend
pub struct MarketSearchResolver {
    search: Arc<dyn SymbolSearch>,
}

impl MarketSearchResolver {
    pub fn new(search: Arc<dyn SymbolSearch>) -> Self {
        Self { search }
    }

    /// Search the provider; failures are logged and read as "no candidates".
    pub async fn search(&self, fragment: &str) -> Vec<CandidateStock> {
        match self.search.search(fragment).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(fragment = %fragment, error = %e, "Market search failed");
                Vec::new()
            }
        }
    }

    /// Resolve the tickers a query refers to.
    ///
    /// Comparison queries keep one ticker per part. Otherwise the full
    /// query is searched once and every candidate in the region is kept;
    /// if the region filter leaves nothing, all candidates are returned.
    pub async fn resolve_ticker(&self, query: &str, geography: Geography) -> Vec<ExtractedTicker> {
        info!(query = %query, region = %geography, "Market search: starting");

        let geography = {
            let detected = GeographyClassifier::classify(query, geography);
            if detected != geography {
                info!(from = %geography, to = %detected, "Geography override from query keywords");
            }
            detected
        };

        if QuerySplitter::is_comparison(query) {
            let parts = QuerySplitter::split(query);
            debug!(?parts, "Comparison query split");

            if parts.len() > 1 {
                let tickers = self.resolve_parts(&parts, geography).await;
                if !tickers.is_empty() {
                    info!(
                        count = tickers.len(),
                        "Resolved tickers from comparison parts"
                    );
                    return tickers;
                }
            }
        }

        let candidates = self.search(query).await;
        debug!(count = candidates.len(), "Full query search results");

        if candidates.is_empty() {
            info!("No matching stock tickers found");
            return Vec::new();
        }

        if !geography.is_global() {
            let filtered = filter_by_region(&candidates, geography);
            debug!(
                exchanges = ?geography.exchange_codes(),
                count = filtered.len(),
                "Region filter applied"
            );

            if !filtered.is_empty() {
                return dedup_by_symbol(filtered.into_iter().map(Into::into).collect());
            }
        }

        dedup_by_symbol(candidates.into_iter().map(Into::into).collect())
    }

    /// One ticker per part: the first candidate on the part's exchanges.
    async fn resolve_parts(&self, parts: &[String], geography: Geography) -> Vec<ExtractedTicker> {
        let mut tickers: Vec<ExtractedTicker> = Vec::new();

        for part in parts {
            let part_geography = GeographyClassifier::classify(part, geography);
            debug!(part = %part, region = %part_geography, "Searching comparison part");

            let candidates = self.search(part).await;
            let filtered = filter_by_region(&candidates, part_geography);

            if let Some(first) = filtered.into_iter().next() {
                if !tickers.iter().any(|t| t.symbol == first.symbol) {
                    tickers.push(first.into());
                }
            }
        }

        tickers
    }
}

#[async_trait]
impl TickerSource for MarketSearchResolver {
    fn name(&self) -> &str {
        "market-search"
    }

    async fn extract(&self, query: &TickerQuery) -> Result<Vec<ExtractedTicker>> {
        Ok(self.resolve_ticker(&query.content, query.geography).await)
    }
}
