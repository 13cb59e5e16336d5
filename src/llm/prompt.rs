//! System prompt for ticker extraction

use crate::models::{Geography, Language};

const BASE_INSTRUCTIONS: &str = r#"You are a financial NLP processor. Extract stock tickers from the query.
If company names are mentioned, convert them to their ticker symbols.
For companies listed in multiple exchanges, prioritize the ticker based on the specified geography"#;

const MARKET_EXAMPLES: &str = r#"US: NYSE, NASDAQ (Example: AAPL for Apple Inc.)
HK: HKEX (Example: 9988.HK for Alibaba)
China: SSE (Example: 600519.SS for Kweichow Moutai), SZSE (Example: 000858.SZ for Wuliangye)
Global: Any exchange, prioritize by market cap"#;

const OUTPUT_RULES: &str = r#"Return ONLY a JSON array of objects with the format: [{"symbol": "TICKER"}]
Do not include any explanations, just the JSON array.
If no tickers are found, return an empty array: []"#;

/// Build the extraction instructions for one request
pub fn build_system_prompt(geography: Geography, language: Language) -> String {
    let mut prompt = String::new();

    if language != Language::English {
        prompt.push_str(&format!("The query is in {}. ", language));
    }

    prompt.push_str(BASE_INSTRUCTIONS);
    prompt.push_str(&format!(" ({}).\n", geography));

    let codes = geography.exchange_codes();
    if !codes.is_empty() {
        prompt.push_str(&format!(
            "For {}, prioritize these exchanges: {}.\n",
            geography,
            codes.join(", ")
        ));
    }

    prompt.push_str(MARKET_EXAMPLES);
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_RULES);
    prompt
}
