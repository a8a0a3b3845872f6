//! Command-line interface definitions.
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it. Options left unset fall back to the YAML config file
//! (`--config`) and then to built-in defaults; see [`crate::config`].

use clap::Parser;

use crate::config::Strategy;

/// Fetch today's news and keep what matters for exam preparation.
///
/// # Examples
///
/// ```sh
/// # Generative filtering, secrets from the environment
/// NEWSAPI_KEY=... GEMINI_API_KEY=... exam_news_digest
///
/// # Keyword filtering only, 20 articles, custom output path
/// exam_news_digest --strategy keyword --max-articles 20 -o out/daily.txt
///
/// # Let the tool pick an available flash model
/// exam_news_digest --auto-detect-model
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the text digest (default: daily.txt)
    #[arg(short, long, env = "DIGEST_OUTPUT")]
    pub output: Option<String>,

    /// Also write the digest as JSON to this path
    #[arg(long, env = "DIGEST_JSON_OUTPUT")]
    pub json_output: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(short, long, env = "DIGEST_CONFIG")]
    pub config: Option<String>,

    /// How articles are filtered
    #[arg(short, long, value_enum, env = "DIGEST_STRATEGY", default_value = "generative")]
    pub strategy: Strategy,

    /// Search term sent to the news API (default: india)
    #[arg(short, long)]
    pub query: Option<String>,

    /// How many days back the search starts (default: 1)
    #[arg(long, allow_hyphen_values = true)]
    pub lookback_days: Option<i64>,

    /// News API sort order (default: publishedAt)
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Keep only the first N fetched articles (default: 15)
    #[arg(short = 'n', long)]
    pub max_articles: Option<usize>,

    /// Filter at most N articles (generative default: 8)
    #[arg(long)]
    pub filter_limit: Option<usize>,

    /// Generative model name (default: gemini-1.5-flash)
    #[arg(short, long, env = "GEMINI_MODEL")]
    pub model: Option<String>,

    /// Ask the model API which models exist and pick a usable one
    #[arg(long)]
    pub auto_detect_model: bool,

    /// Timeout of the news request in seconds (default: 10)
    #[arg(long)]
    pub fetch_timeout_secs: Option<u64>,

    /// Timeout of each model call in seconds (default: 60)
    #[arg(long)]
    pub model_timeout_secs: Option<u64>,

    /// Retries per model call before the article is skipped (default: 0)
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Without a model key, write unfiltered articles instead of failing
    #[arg(long)]
    pub raw_fallback: bool,

    /// Fail when no repository token is present
    #[arg(long)]
    pub require_repo_token: bool,

    /// Offset of the header timestamp from UTC, in minutes (default: 330)
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,

    /// Zone label printed after the header timestamp (default: IST)
    #[arg(long)]
    pub zone_label: Option<String>,

    /// Base URL of the news API
    #[arg(long, env = "NEWSAPI_BASE_URL", default_value = "https://newsapi.org")]
    pub news_api_base: String,

    /// Base URL of the generative model API
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub model_api_base: String,

    /// News API key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Generative model API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Repository access token, only checked for presence
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub repo_token: Option<String>,
}

/// Parse `args` (without the binary name) while ignoring every `env =` source.
///
/// Values that come from the test runner's environment are reset to what an
/// empty environment would give, so tests only see the flags they pass.
#[cfg(test)]
pub(crate) fn parse_isolated(args: &[&str]) -> Cli {
    let mut full = vec!["exam_news_digest"];
    full.extend_from_slice(args);
    let mut cli = Cli::parse_from(full);

    let passed = |long: &str, short: Option<&str>| {
        args.iter().any(|a| {
            *a == long || a.starts_with(&format!("{long}=")) || Some(*a) == short
        })
    };

    if !passed("--output", Some("-o")) {
        cli.output = None;
    }
    if !passed("--json-output", None) {
        cli.json_output = None;
    }
    if !passed("--config", Some("-c")) {
        cli.config = None;
    }
    if !passed("--strategy", Some("-s")) {
        cli.strategy = Strategy::Generative;
    }
    if !passed("--model", Some("-m")) {
        cli.model = None;
    }
    if !passed("--news-api-base", None) {
        cli.news_api_base = "https://newsapi.org".to_string();
    }
    if !passed("--model-api-base", None) {
        cli.model_api_base = "https://generativelanguage.googleapis.com".to_string();
    }
    if !passed("--news-api-key", None) {
        cli.news_api_key = None;
    }
    if !passed("--gemini-api-key", None) {
        cli.gemini_api_key = None;
    }
    if !passed("--repo-token", None) {
        cli.repo_token = None;
    }
    cli
}
