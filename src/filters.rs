//! Turning fetched articles into digest items.
//!
//! - [`keyword_filter`]: title contains an exam keyword (case-insensitive)
//! - [`generative_filter`]: one model call per article, fail-soft per item
//! - [`raw_items`] / [`title_only_items`]: unfiltered renderings used as
//!   the raw strategy and as the fallback when model setup fails
//!
//! Every function preserves article order.

use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

use crate::api::AskAsync;
use crate::models::Article;

pub const PROMPT_PLACEHOLDER: &str = "{news}";

/// Instruction sent with every article in generative mode.
pub const DEFAULT_PROMPT: &str = "\
Filter this news for UPSC/SSC/Bank exam students.
- KEEP: Economy, Banking, Government schemes, Polity, Environment, International relations, Science & Tech
- DROP: Sports, Bollywood, Local crime, Entertainment
Output ONLY:
**Title:** [short title]
**Key Points:** [2 exam-oriented bullet points]
**Category:** [Economy/Polity/Etc]

News: {news}";

/// Exam-relevant vocabulary used by the keyword strategy.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "rbi",
    "reserve bank",
    "bank",
    "repo rate",
    "inflation",
    "gdp",
    "economy",
    "budget",
    "fiscal",
    "tax",
    "gst",
    "sebi",
    "scheme",
    "yojana",
    "ministry",
    "minister",
    "cabinet",
    "government",
    "parliament",
    "lok sabha",
    "rajya sabha",
    "supreme court",
    "high court",
    "constitution",
    "election commission",
    "policy",
    "niti aayog",
    "isro",
    "drdo",
    "defence",
    "environment",
    "climate",
    "summit",
    "treaty",
    "bilateral",
    "united nations",
    "g20",
    "brics",
    "export",
    "import",
    "trade",
];

/// Trim, lowercase, drop empties and duplicates; first occurrence wins.
pub fn normalize_keywords<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raw.into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .unique()
        .collect()
}

/// Does the title mention any of the (already lowercased) keywords?
pub fn title_matches(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|k| title.contains(k.as_str()))
}

/// Keep the articles whose title contains a keyword.
#[instrument(level = "info", skip_all, fields(articles = articles.len(), keywords = keywords.len()))]
pub fn keyword_filter(articles: &[Article], keywords: &[String]) -> Vec<String> {
    let items: Vec<String> = articles
        .iter()
        .filter(|a| title_matches(a.title(), keywords))
        .map(Article::as_summary_block)
        .collect();
    info!(kept = items.len(), "Keyword filter done");
    items
}

pub fn raw_items(articles: &[Article]) -> Vec<String> {
    articles.iter().map(Article::as_summary_block).collect()
}

pub fn title_only_items(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .map(|a| format!("Raw: {}", a.title()))
        .collect()
}

pub fn render_prompt(template: &str, article: &Article) -> String {
    template.replace(PROMPT_PLACEHOLDER, &article.as_prompt_input())
}

/// Ask the model about each article in turn.
///
/// Calls are made one after another. A failed call or an empty answer drops
/// only that article.
#[instrument(level = "info", skip_all, fields(articles = articles.len()))]
pub async fn generative_filter<A: AskAsync>(
    asker: &A,
    template: &str,
    articles: &[Article],
) -> Vec<String> {
    let items: Vec<String> = stream::iter(articles.iter().enumerate())
        .then(|(i, article)| async move {
            let prompt = render_prompt(template, article);
            match asker.ask(&prompt).await {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        debug!(index = i + 1, "Model returned nothing; skipping");
                        None
                    } else {
                        info!(index = i + 1, "Filtered news item");
                        Some(text.to_string())
                    }
                }
                Err(e) => {
                    warn!(index = i + 1, error = %e, "Skipping news item");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(kept = items.len(), "Generative filter done");
    items
}
