//! Direct ticker pattern matching
//!
//! Picks ticker-shaped tokens straight out of the query text:
//! bare uppercase symbols (AAPL) and numeric codes with an optional
//! exchange suffix (9988.HK, 600519.SS, 700). No network calls.

use crate::models::{ExtractedTicker, TickerQuery};
use crate::resolver::TickerSource;
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref US_TICKER: Regex =
        Regex::new(r"(?-u:\b)[A-Z]{1,5}(?-u:\b)").expect("valid US ticker pattern");
    static ref NUMERIC_TICKER: Regex = Regex::new(r"(?-u:\b)[0-9]{1,6}(?:\.[A-Z]{1,3})?(?-u:\b)")
        .expect("valid numeric ticker pattern");
}

/// Regex-only ticker matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPatternMatcher;

impl DirectPatternMatcher {
    /// Find every ticker-shaped token in `text`, ordered by position.
    pub fn find_matches(text: &str) -> Vec<ExtractedTicker> {
        let numeric: Vec<_> = NUMERIC_TICKER.find_iter(text).collect();

        // The "HK" of "9988.HK" is a suffix, not a symbol of its own
        let symbols = US_TICKER.find_iter(text).filter(|m| {
            !numeric
                .iter()
                .any(|n| m.start() >= n.start() && m.end() <= n.end())
        });

        let mut found: Vec<_> = symbols.chain(numeric.iter().copied()).collect();
        found.sort_by_key(|m| m.start());

        let mut seen: Vec<&str> = Vec::with_capacity(found.len());
        for m in found {
            if !seen.contains(&m.as_str()) {
                seen.push(m.as_str());
            }
        }

        debug!(potential_tickers = ?seen, "Direct pattern scan");

        seen.into_iter().map(ExtractedTicker::new).collect()
    }
}

#[async_trait]
impl TickerSource for DirectPatternMatcher {
    fn name(&self) -> &str {
        "direct-match"
    }

    async fn extract(&self, query: &TickerQuery) -> Result<Vec<ExtractedTicker>> {
        Ok(Self::find_matches(&query.content))
    }
}
