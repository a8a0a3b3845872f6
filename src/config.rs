//! Run configuration: the optional YAML file merged with the CLI.
//!
//! Precedence is CLI/environment, then the config file, then the built-in
//! defaults below. Secrets are only ever read from the CLI/environment and
//! are validated here, before anything touches the network.

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cli::Cli;
use crate::error::{MAX_LOOKBACK_DAYS, SetupError};
use crate::filters::{DEFAULT_KEYWORDS, DEFAULT_PROMPT, PROMPT_PLACEHOLDER, normalize_keywords};

pub const DEFAULT_OUTPUT: &str = "daily.txt";
pub const DEFAULT_QUERY: &str = "india";
pub const DEFAULT_SORT_BY: &str = "publishedAt";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 1;
pub const DEFAULT_MAX_ARTICLES: usize = 15;
pub const DEFAULT_GENERATIVE_LIMIT: usize = 8;
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 5 * 60 + 30;
pub const DEFAULT_ZONE_LABEL: &str = "IST";

/// How fetched articles are turned into digest items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Keep articles whose title mentions an exam keyword.
    Keyword,
    /// Let the generative model filter and rewrite each article.
    Generative,
    /// Keep every article unfiltered.
    Raw,
}

/// Contents of the optional `config.yaml`. Every field may be omitted.
///
/// ```yaml
/// query: india
/// max_articles: 20
/// keywords: [rbi, budget, isro]
/// prompt: |
///   Keep only exam-relevant news.
///   News: {news}
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub query: Option<String>,
    pub lookback_days: Option<i64>,
    pub sort_by: Option<String>,
    pub max_articles: Option<usize>,
    pub filter_limit: Option<usize>,
    pub model: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub prompt: Option<String>,
    pub output: Option<String>,
    pub utc_offset_minutes: Option<i32>,
    pub zone_label: Option<String>,
}

impl FileConfig {
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, SetupError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SetupError::ConfigRead {
            path: path.to_string(),
            source,
        })?;
        let parsed = Self::parse(&raw).map_err(|source| SetupError::ConfigParse {
            path: path.to_string(),
            source,
        })?;
        info!(path, "Loaded configuration");
        Ok(parsed)
    }

    pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to `null`, which we treat as "no overrides".
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[derive(Debug, Clone)]
pub struct NewsSettings {
    pub base_url: String,
    pub api_key: String,
    pub query: String,
    pub lookback_days: i64,
    pub sort_by: String,
    pub max_articles: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub auto_detect: bool,
    pub timeout: Duration,
    pub max_retries: usize,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Effective strategy, after a possible raw fallback.
    pub strategy: Strategy,
    pub news: NewsSettings,
    /// Present only when the effective strategy is generative.
    pub model: Option<ModelSettings>,
    pub filter_limit: Option<usize>,
    pub keywords: Vec<String>,
    pub prompt: String,
    pub output: PathBuf,
    pub json_output: Option<PathBuf>,
    pub offset: FixedOffset,
    pub zone_label: String,
}

/// Treat unset and blank secrets alike; CI runners export unset secrets as "".
fn secret(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Settings {
    /// Merge CLI and file configuration, checking required secrets first.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, SetupError> {
        let news_key = secret(&cli.news_api_key).ok_or(SetupError::MissingSecret {
            name: "NEWSAPI_KEY",
            flag: "news-api-key",
        })?;

        if cli.require_repo_token && secret(&cli.repo_token).is_none() {
            return Err(SetupError::MissingSecret {
                name: "GITHUB_TOKEN",
                flag: "repo-token",
            });
        }

        let mut strategy = cli.strategy;
        let model_key = secret(&cli.gemini_api_key);
        if strategy == Strategy::Generative && model_key.is_none() {
            if cli.raw_fallback {
                warn!("GEMINI_API_KEY missing; writing unfiltered articles");
                strategy = Strategy::Raw;
            } else {
                return Err(SetupError::MissingSecret {
                    name: "GEMINI_API_KEY",
                    flag: "gemini-api-key",
                });
            }
        }

        let prompt = file.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        if strategy == Strategy::Generative && !prompt.contains(PROMPT_PLACEHOLDER) {
            return Err(SetupError::PromptWithoutPlaceholder);
        }

        let offset_minutes = cli
            .utc_offset_minutes
            .or(file.utc_offset_minutes)
            .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES);
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(SetupError::InvalidOffset(offset_minutes))?;

        let lookback_days = cli
            .lookback_days
            .or(file.lookback_days)
            .unwrap_or(DEFAULT_LOOKBACK_DAYS);
        if !(0..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(SetupError::InvalidLookback(lookback_days));
        }

        let keywords = match file.keywords {
            Some(list) => normalize_keywords(list.iter().map(String::as_str)),
            None => normalize_keywords(DEFAULT_KEYWORDS.iter().copied()),
        };

        let filter_limit = cli.filter_limit.or(file.filter_limit).or(match strategy {
            Strategy::Generative => Some(DEFAULT_GENERATIVE_LIMIT),
            _ => None,
        });

        let model = (strategy == Strategy::Generative).then(|| ModelSettings {
            base_url: cli.model_api_base.trim_end_matches('/').to_string(),
            api_key: model_key.clone().unwrap_or_default(),
            model: cli
                .model
                .clone()
                .or(file.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            auto_detect: cli.auto_detect_model,
            timeout: Duration::from_secs(
                cli.model_timeout_secs.unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
            ),
            max_retries: cli.max_retries.unwrap_or(0),
        });

        Ok(Self {
            strategy,
            news: NewsSettings {
                base_url: cli.news_api_base.trim_end_matches('/').to_string(),
                api_key: news_key,
                query: cli
                    .query
                    .clone()
                    .or(file.query)
                    .unwrap_or_else(|| DEFAULT_QUERY.to_string()),
                lookback_days,
                sort_by: cli
                    .sort_by
                    .clone()
                    .or(file.sort_by)
                    .unwrap_or_else(|| DEFAULT_SORT_BY.to_string()),
                max_articles: cli
                    .max_articles
                    .or(file.max_articles)
                    .unwrap_or(DEFAULT_MAX_ARTICLES),
                timeout: Duration::from_secs(
                    cli.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
                ),
            },
            model,
            filter_limit,
            keywords,
            prompt,
            output: PathBuf::from(
                cli.output
                    .clone()
                    .or(file.output)
                    .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            ),
            json_output: cli.json_output.as_ref().map(PathBuf::from),
            offset,
            zone_label: cli
                .zone_label
                .clone()
                .or(file.zone_label)
                .unwrap_or_else(|| DEFAULT_ZONE_LABEL.to_string()),
        })
    }
}
