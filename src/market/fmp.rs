//! Financial Modeling Prep search client
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::SymbolSearch;
use crate::config::MarketDataConfig;
use crate::error::TickerError;
use crate::models::CandidateStock;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Name/symbol search against the FMP `/v3/search` endpoint
#[derive(Clone)]
pub struct FmpClient {
    client: Client,
    base_url: String,
    api_key: String,
    limit: u32,
}

impl FmpClient {
    pub fn new(config: &MarketDataConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            limit: config.limit,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/v3/search", self.base_url)
    }
}

#[async_trait]
impl SymbolSearch for FmpClient {
    async fn search(&self, fragment: &str) -> Result<Vec<CandidateStock>> {
        if self.api_key.is_empty() {
            return Err(TickerError::ConfigError(
                "FMP_API_KEY not configured".to_string(),
            ));
        }

        debug!(fragment = %fragment, "Calling FMP search");

        let limit = self.limit.to_string();
        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("query", fragment),
                ("limit", limit.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("FMP search request failed: {}", e);
                TickerError::SearchError(format!("FMP request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TickerError::SearchError(format!(
                "FMP returned {}: {}",
                status, body
            )));
        }

        let candidates: Vec<CandidateStock> = response
            .json()
            .await
            .map_err(|e| TickerError::MalformedResponse(format!("FMP search body: {}", e)))?;

        Ok(candidates
            .into_iter()
            .filter(|c| !c.symbol.trim().is_empty())
            .collect())
    }
}
