//! News search client (NewsAPI `v2/everything`).
//!
//! One GET per run. The request is bounded to the last `lookback_days` days,
//! sorted by publication time, and the first `max_articles` results are
//! kept. Any failure (transport, HTTP status, body) degrades to an empty
//! list: a day without news is still a valid digest.

use std::error::Error;

use chrono::{DateTime, Duration, TimeZone};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::NewsSettings;
use crate::models::{Article, NewsApiResponse};

/// Source of articles for the pipeline.
pub trait FetchArticles {
    /// Return the latest articles; never fails, an error means "none".
    async fn fetch_latest(&self) -> Vec<Article>;
}

pub struct NewsApiClient {
    http: Client,
    settings: NewsSettings,
}

impl NewsApiClient {
    pub fn new(settings: NewsSettings) -> Result<Self, Box<dyn Error>> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { http, settings })
    }

    /// Build the search URL with `from` set `lookback_days` before `now`.
    ///
    /// A lookback that does not fit the calendar is an error rather than a
    /// panic, so `fetch_latest` can degrade it to an empty result.
    pub fn query_url<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<Url, Box<dyn Error>> {
        let lookback = self.settings.lookback_days;
        let from = Duration::try_days(lookback)
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or_else(|| format!("lookback of {lookback} days is out of range"))?
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();
        let url = Url::parse_with_params(
            &format!("{}/v2/everything", self.settings.base_url),
            &[
                ("q", self.settings.query.as_str()),
                ("from", from.as_str()),
                ("sortBy", self.settings.sort_by.as_str()),
                ("apiKey", self.settings.api_key.as_str()),
            ],
        )?;
        Ok(url)
    }

    async fn try_fetch(&self) -> Result<Vec<Article>, Box<dyn Error>> {
        let url = self.query_url(chrono::Local::now())?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let parsed: NewsApiResponse = serde_json::from_str(&body)?;

        if !status.is_success() {
            return Err(format!(
                "news API returned HTTP {status} (status={})",
                parsed.status.as_deref().unwrap_or("unknown")
            )
            .into());
        }

        info!(
            found = parsed.articles.len(),
            total_results = ?parsed.total_results,
            "Found news articles"
        );
        Ok(parsed.articles)
    }
}

impl FetchArticles for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(query = %self.settings.query))]
    async fn fetch_latest(&self) -> Vec<Article> {
        match self.try_fetch().await {
            Ok(mut articles) => {
                articles.truncate(self.settings.max_articles);
                debug!(
                    titles = ?articles.iter().map(Article::title).collect::<Vec<_>>(),
                    newest = ?articles.iter().filter_map(Article::published).max(),
                    "Kept articles"
                );
                articles
            }
            Err(e) => {
                warn!(error = %e, "News fetch failed; continuing with no articles");
                Vec::new()
            }
        }
    }
}
