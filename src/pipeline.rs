//! fetch → filter → digest.
//!
//! The pipeline never fails: fetch errors yield no articles and per-item
//! model errors drop single items. Persisting the digest is left to the
//! caller so the same run can feed several writers.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{info, instrument, warn};

use crate::api::AskAsync;
use crate::config::{Settings, Strategy};
use crate::filters::{generative_filter, keyword_filter, raw_items, title_only_items};
use crate::models::{Article, Digest};
use crate::news::FetchArticles;

/// How the generative step is backed for this run.
pub enum Generator<A> {
    /// A ready model client.
    Ready(A),
    /// Model setup failed (e.g. auto-detection found nothing usable).
    Unavailable(String),
}

fn cap(articles: &[Article], limit: Option<usize>) -> &[Article] {
    match limit {
        Some(n) if n < articles.len() => &articles[..n],
        _ => articles,
    }
}

/// Run one pass of the pipeline.
///
/// `generator` is only consulted for the generative strategy.
#[instrument(level = "info", skip_all, fields(strategy = ?settings.strategy))]
pub async fn run<F, A>(
    settings: &Settings,
    source: &F,
    generator: Option<&Generator<A>>,
    now: DateTime<Utc>,
) -> Digest
where
    F: FetchArticles,
    A: AskAsync,
{
    let articles = source.fetch_latest().await;
    let selected = cap(&articles, settings.filter_limit);
    info!(
        fetched = articles.len(),
        selected = selected.len(),
        "Filtering articles"
    );

    let (strategy, items) = match (settings.strategy, generator) {
        (Strategy::Keyword, _) => (Strategy::Keyword, keyword_filter(selected, &settings.keywords)),
        (Strategy::Raw, _) => (Strategy::Raw, raw_items(selected)),
        (Strategy::Generative, Some(Generator::Ready(asker))) => (
            Strategy::Generative,
            generative_filter(asker, &settings.prompt, selected).await,
        ),
        (Strategy::Generative, Some(Generator::Unavailable(reason))) => {
            warn!(%reason, "Model unavailable; saving raw titles");
            (Strategy::Raw, title_only_items(&articles))
        }
        (Strategy::Generative, None) => {
            warn!("No model configured; saving raw titles");
            (Strategy::Raw, title_only_items(&articles))
        }
    };

    let generated_at: DateTime<FixedOffset> = now.with_timezone(&settings.offset);
    Digest {
        generated_at,
        strategy,
        items,
    }
}
