//! Data models for fetched articles and the digest written at the end of a run.
//!
//! - [`Article`]: one entry of the news API's `articles` array
//! - [`NewsApiResponse`]: the part of the search response we read
//! - [`Digest`]: the filtered items of a single run, ready to be rendered
//!
//! The news API uses camelCase field names and emits `null` for missing
//! values, so every article field is optional on the wire and read back as
//! empty text through the accessor methods.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::config::Strategy;

/// A news article as returned by the search endpoint.
///
/// Only the fields the pipeline uses are deserialized; `source`, `url`,
/// `content` and friends are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Headline of the article.
    pub title: Option<String>,
    /// Short teaser text supplied by the publisher.
    pub description: Option<String>,
    /// Publication timestamp, RFC 3339 as sent by the API.
    pub published_at: Option<String>,
}

impl Article {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("").trim()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("").trim()
    }

    /// Publication time, if the API sent a parseable one.
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        self.published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    /// The block used by the keyword and raw strategies.
    pub fn as_summary_block(&self) -> String {
        format!("Title: {}\nSummary: {}", self.title(), self.description())
    }

    /// The article text handed to the generative model.
    pub fn as_prompt_input(&self) -> String {
        format!("Title: {}\nDesc: {}", self.title(), self.description())
    }
}

/// Body of a `v2/everything` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// Everything a single run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    /// When the digest was assembled, in the configured display offset.
    pub generated_at: DateTime<FixedOffset>,
    /// Strategy that actually produced the items (after any fallback).
    pub strategy: Strategy,
    /// Filtered items, in article order.
    pub items: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_deserializes_nulls() {
        let json = r#"{
            "source": {"id": null, "name": "The Hindu"},
            "title": "RBI keeps repo rate unchanged",
            "description": null,
            "publishedAt": "2026-10-18T09:15:00Z"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.title(), "RBI keeps repo rate unchanged");
        assert_eq!(article.description(), "");
        assert!(article.published().is_some());
    }

    #[test]
    fn test_response_without_articles() {
        let json = r#"{"status": "error", "code": "apiKeyInvalid", "message": "bad key"}"#;
        let resp: NewsApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status.as_deref(), Some("error"));
        assert!(resp.articles.is_empty());
    }

    #[test]
    fn test_summary_and_prompt_blocks() {
        let article = Article {
            title: Some("  Budget 2026 highlights ".to_string()),
            description: Some("Fiscal deficit target cut".to_string()),
            ..Default::default()
        };
        assert_eq!(
            article.as_summary_block(),
            "Title: Budget 2026 highlights\nSummary: Fiscal deficit target cut"
        );
        assert_eq!(
            article.as_prompt_input(),
            "Title: Budget 2026 highlights\nDesc: Fiscal deficit target cut"
        );
    }

    #[test]
    fn test_unparseable_published_at() {
        let article = Article {
            published_at: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(article.published().is_none());
    }
}
