use clap::Parser;
use ticker_resolver::{Geography, Language, ResolverConfig, TickerQuery, TickerResolver};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Extract stock tickers from a natural-language query
#[derive(Debug, Parser)]
#[command(name = "ticker-resolve", version)]
struct Cli {
    /// Free-form query, e.g. "compare Apple and Tencent"
    query: String,

    /// Market to prioritize: US, HK, China or Global
    #[arg(short, long, default_value = "Global")]
    geography: Geography,

    /// Query language: English, SimplifiedChinese or TraditionalChinese
    #[arg(short, long, default_value = "English")]
    language: Language,

    /// Print the strategy trace along with the tickers
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing; logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.query.trim().is_empty() {
        return Err("query must not be empty".into());
    }

    let config = ResolverConfig::from_env()?;
    let resolver = TickerResolver::from_config(&config)?;

    info!(
        primary = %config.primary.name,
        fallback = %config.fallback.name,
        direct_match = config.direct_match_fallback,
        "Resolver initialized"
    );

    let query = TickerQuery::new(cli.query, cli.geography, cli.language);
    let resolution = resolver.resolve_detailed(&query).await;

    let output = if cli.trace {
        serde_json::to_string_pretty(&resolution)?
    } else {
        serde_json::to_string_pretty(&serde_json::json!({ "tickers": resolution.tickers }))?
    };
    println!("{}", output);

    Ok(())
}
