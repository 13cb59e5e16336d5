//! Core data models for ticker resolution

use crate::error::TickerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ================= Enums =================
//

/// Market region used to scope and filter ticker results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Geography {
    #[serde(rename = "US")]
    UnitedStates,
    #[serde(rename = "HK")]
    HongKong,
    China,
    #[default]
    Global,
}

const US_EXCHANGES: &[&str] = &["NYSE", "NASDAQ", "AMEX", "OTC", "CBOE"];
const HK_EXCHANGES: &[&str] = &["HKSE", "HK", "HKEX"];
const CHINA_EXCHANGES: &[&str] = &["SSE", "SZSE", "SHG", "SHE", "SHA", "SS"];

impl Geography {
    /// Exchange codes that belong to this region, in a fixed order.
    /// `Global` has none, which means "no filter".
    pub fn exchange_codes(self) -> &'static [&'static str] {
        match self {
            Geography::UnitedStates => US_EXCHANGES,
            Geography::HongKong => HK_EXCHANGES,
            Geography::China => CHINA_EXCHANGES,
            Geography::Global => &[],
        }
    }

    pub fn is_global(self) -> bool {
        self == Geography::Global
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Geography::UnitedStates => "US",
            Geography::HongKong => "HK",
            Geography::China => "China",
            Geography::Global => "Global",
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Geography {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "us" | "usa" => Ok(Geography::UnitedStates),
            "hk" | "hongkong" | "hong kong" => Ok(Geography::HongKong),
            "china" | "cn" => Ok(Geography::China),
            "global" => Ok(Geography::Global),
            other => Err(TickerError::InvalidInput(format!(
                "unknown geography '{}', expected US, HK, China or Global",
                other
            ))),
        }
    }
}

/// Language the query is written in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    SimplifiedChinese,
    TraditionalChinese,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::SimplifiedChinese => "SimplifiedChinese",
            Language::TraditionalChinese => "TraditionalChinese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "english" | "en" => Ok(Language::English),
            "simplifiedchinese" | "zhhans" | "zhcn" => Ok(Language::SimplifiedChinese),
            "traditionalchinese" | "zhhant" | "zhtw" | "zhhk" => {
                Ok(Language::TraditionalChinese)
            }
            _ => Err(TickerError::InvalidInput(format!(
                "unknown language '{}', expected English, SimplifiedChinese or TraditionalChinese",
                s
            ))),
        }
    }
}

//
// ================= Query =================
//

/// A user query together with the caller's market and language hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerQuery {
    pub content: String,
    #[serde(default)]
    pub geography: Geography,
    #[serde(default)]
    pub language: Language,
}

impl TickerQuery {
    pub fn new(content: impl Into<String>, geography: Geography, language: Language) -> Self {
        Self {
            content: content.into(),
            geography,
            language,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

//
// ================= Search Results =================
//

/// A stock record returned by the market search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStock {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Display name of the exchange, e.g. "NASDAQ Global Select"
    #[serde(default, alias = "stockExchange")]
    pub exchange: Option<String>,
    /// Canonical exchange code, e.g. "NASDAQ"
    #[serde(default)]
    pub exchange_short_name: Option<String>,
    #[serde(default, rename = "type")]
    pub stock_type: Option<String>,
}

impl CandidateStock {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            exchange: None,
            exchange_short_name: None,
            stock_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_exchange_short_name(mut self, code: impl Into<String>) -> Self {
        self.exchange_short_name = Some(code.into());
        self
    }

    /// True when the provider reported at least one exchange field
    pub fn has_exchange_info(&self) -> bool {
        self.exchange.as_deref().is_some_and(|e| !e.is_empty())
            || self.exchange_short_name.as_deref().is_some_and(|e| !e.is_empty())
    }
}

//
// ================= Output =================
//

/// A resolved ticker, the unit the pipeline hands back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTicker {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl ExtractedTicker {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            exchange: None,
        }
    }
}

impl From<CandidateStock> for ExtractedTicker {
    fn from(stock: CandidateStock) -> Self {
        Self {
            symbol: stock.symbol,
            name: stock.name,
            exchange: stock.exchange,
        }
    }
}

impl From<&CandidateStock> for ExtractedTicker {
    fn from(stock: &CandidateStock) -> Self {
        stock.clone().into()
    }
}

/// Drop repeated symbols, keeping the first occurrence
pub fn dedup_by_symbol(tickers: Vec<ExtractedTicker>) -> Vec<ExtractedTicker> {
    let mut out: Vec<ExtractedTicker> = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        if !out.iter().any(|t| t.symbol == ticker.symbol) {
            out.push(ticker);
        }
    }
    out
}
