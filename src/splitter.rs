//! Comparison query splitting
//!
//! "Compare AAPL and Tesla" is resolved as two independent sub-queries.
//! Splitting is a heuristic: comparison keywords and filler words are
//! dropped, the rest is merged back into phrases, and anything that
//! already looks like a ticker stands on its own.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COMPARISON_QUERY: Regex =
        Regex::new(r"(?i)compare|vs|versus|对比|比较|and").expect("valid comparison pattern");
    static ref COMPARISON_KEYWORDS: Regex =
        Regex::new(r"(?i)compare|versus|vs|对比|比较").expect("valid keyword pattern");
    static ref CONJUNCTION: Regex = Regex::new(r"(?i)\s+and\s+").expect("valid conjunction pattern");
    static ref SYMBOL_TOKEN: Regex = Regex::new(r"^[A-Z]{1,5}$").expect("valid symbol pattern");
    static ref CODE_TOKEN: Regex =
        Regex::new(r"^[0-9]{1,6}(?:\.[A-Z]{1,3})?$").expect("valid code pattern");
}

const STOP_WORDS: &[&str] = &[
    "to", "with", "the", "a", "an", "in", "on", "at", "of", "for", "by", "as",
];

/// Splits comparison queries into per-entity parts
pub struct QuerySplitter;

impl QuerySplitter {
    /// Whether the query looks like it names several entities
    pub fn is_comparison(text: &str) -> bool {
        COMPARISON_QUERY.is_match(text)
    }

    /// Break a query into company-name phrases and ticker-like tokens,
    /// in the order they appear.
    pub fn split(text: &str) -> Vec<String> {
        let simplified = COMPARISON_KEYWORDS.replace_all(text, "");
        let simplified = CONJUNCTION.replace_all(&simplified, " ");
        let simplified = simplified.replace("港股", "HK");

        let tokens = simplified
            .split_whitespace()
            .filter(|token| token.chars().count() > 1 && !is_stop_word(token));

        let mut parts = Vec::new();
        let mut phrase = String::new();

        for token in tokens {
            if looks_like_ticker(token) {
                flush_phrase(&mut phrase, &mut parts);
                parts.push(token.to_string());
            } else {
                if !phrase.is_empty() {
                    phrase.push(' ');
                }
                phrase.push_str(token);
            }
        }

        flush_phrase(&mut phrase, &mut parts);
        parts
    }
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.iter().any(|w| w.eq_ignore_ascii_case(token))
}

fn looks_like_ticker(token: &str) -> bool {
    SYMBOL_TOKEN.is_match(token) || CODE_TOKEN.is_match(token)
}

fn flush_phrase(phrase: &mut String, parts: &mut Vec<String>) {
    let trimmed = phrase.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
    phrase.clear();
}
