//! Ticker Resolver
//!
//! Maps free-form stock questions (English or Chinese) to ticker symbols:
//! - Understands market hints (US, Hong Kong, mainland China, Global)
//! - Splits comparison queries ("compare Apple and Tencent") per company
//! - Combines language-model extraction with market-data search
//! - Degrades to an empty answer instead of failing
//!
//! FALLBACK CHAIN:
//! PRIMARY LLM → MARKET SEARCH → FALLBACK LLM → EMPTY

pub mod classifier;
pub mod config;
pub mod error;
pub mod llm;
pub mod market;
pub mod matcher;
pub mod models;
pub mod resolver;
pub mod splitter;

pub use error::Result;

// Re-export common types
pub use classifier::GeographyClassifier;
pub use config::ResolverConfig;
pub use matcher::DirectPatternMatcher;
pub use models::*;
pub use resolver::{Resolution, Strategy, TickerResolver, TickerSource};
pub use splitter::QuerySplitter;
