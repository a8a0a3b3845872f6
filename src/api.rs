//! Generative model client and the retry decorator around it.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait, "send text, get text back"
//! - [`GeminiClient`]: talks to the Gemini `generateContent` endpoint and can
//!   list the models available to the key
//! - [`RetryAsk`]: decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! Retries are off by default (`max_retries = 0`): a failed call is reported
//! once and the caller skips the article. When enabled, delays grow
//! exponentially from the base delay, are capped at 30 seconds and get
//! 0-250ms of random jitter.

use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ModelSettings;
use crate::utils::truncate_for_log;

/// Trait for async LLM interaction.
///
/// Implementors send a prompt to a model and hand back its text response.
/// The pipeline is generic over this trait so tests can plug in scripted
/// responders.
pub trait AskAsync {
    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Wrap an existing [`AskAsync`] implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The client to wrap
    /// * `max_retries` - Extra attempts after the first failure (0 disables retrying)
    /// * `base_delay` - Delay before the first retry; doubles on each further attempt
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = GeminiClient::new(&settings)?;
    /// let retry_client = RetryAsk::new(client, 2, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let factor = 1u32 << (attempt.saturating_sub(1)).min(16);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    #[instrument(level = "debug", skip_all)]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_t0.elapsed().as_millis(),
                                error = %e,
                                "ask() exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize, Debug)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Deserialize, Debug, Default)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiResponseContent,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiError>,
}

/// One entry of the `models` listing.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Name without the `models/` resource prefix.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn can_generate(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

#[derive(Deserialize, Debug)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    error: Option<GeminiError>,
}

/// Choose a model from a listing.
///
/// Prefers `preferred` when it is listed, then the first "flash" model, then
/// any model that supports `generateContent`.
///
/// # Arguments
///
/// * `models` - The listing returned by [`GeminiClient::list_models`]
/// * `preferred` - The configured model name, without the `models/` prefix
///
/// # Returns
///
/// The chosen short model name, or `None` when no listed model can generate
/// content.
///
/// # Example
///
/// ```ignore
/// let models = client.list_models().await?;
/// assert_eq!(pick_model(&models, "gemini-1.5-flash").as_deref(), Some("gemini-1.5-flash"));
/// ```
pub fn pick_model(models: &[ModelInfo], preferred: &str) -> Option<String> {
    let usable: Vec<&ModelInfo> = models.iter().filter(|m| m.can_generate()).collect();
    usable
        .iter()
        .find(|m| m.short_name() == preferred)
        .or_else(|| usable.iter().find(|m| m.short_name().contains("flash")))
        .or_else(|| usable.first())
        .map(|m| m.short_name().to_string())
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, Box<dyn Error>> {
    let resp: GeminiResponse = serde_json::from_str(body)?;
    if let Some(err) = resp.error {
        return Err(format!("Gemini API error: {}", err.message).into());
    }
    let text = resp
        .candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .ok_or("No candidates returned from Gemini")?;
    Ok(text)
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(settings: &ModelSettings) -> Result<Self, Box<dyn Error>> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Fetch the models available to this key.
    #[instrument(level = "info", skip_all)]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, Box<dyn Error>> {
        let url = format!("{}/v1beta/models", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("pageSize", "1000")])
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let listing: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| format!("unexpected model listing (HTTP {status}): {e}"))?;
        if let Some(err) = listing.error {
            return Err(format!("Gemini API error: {}", err.message).into());
        }
        info!(count = listing.models.len(), "Listed available models");
        Ok(listing.models)
    }

    /// Replace the configured model with one the key can actually use.
    pub async fn detect_model(self) -> Result<Self, Box<dyn Error>> {
        let models = self.list_models().await?;
        let chosen = pick_model(&models, &self.model)
            .ok_or("no listed model supports generateContent")?;
        info!(model = %chosen, requested = %self.model, "Auto-detected model");
        Ok(self.with_model(chosen))
    }
}

impl AskAsync for GeminiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text }],
            }],
        };

        let resp = self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let dt = t0.elapsed();

        let res = match extract_text(&body) {
            Ok(text) if status.is_success() => Ok(text),
            Ok(_) => Err(format!("Gemini returned HTTP {status}").into()),
            Err(e) if status.is_success() => Err(e),
            Err(e) => Err(format!("Gemini returned HTTP {status}: {e}").into()),
        };

        match &res {
            Ok(text) => debug!(
                elapsed_ms = dt.as_millis(),
                response_preview = %truncate_for_log(text, 200),
                "Model call succeeded"
            ),
            Err(e) => warn!(elapsed_ms = dt.as_millis(), error = %e, "API call failed"),
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Flaky {
        failures_left: Cell<usize>,
        calls: Cell<usize>,
    }

    impl AskAsync for Flaky {
        async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err("transient".into());
            }
            Ok(format!("echo: {text}"))
        }
    }

    fn model(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: format!("models/{name}"),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_no_retries_by_default() {
        let inner = Flaky {
            failures_left: Cell::new(1),
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(inner, 0, StdDuration::from_millis(1));
        assert!(api.ask("x").await.is_err());
        assert_eq!(api.inner.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let inner = Flaky {
            failures_left: Cell::new(2),
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(inner, 2, StdDuration::from_millis(1));
        assert_eq!(api.ask("hi").await.unwrap(), "echo: hi");
        assert_eq!(api.inner.calls.get(), 3);
    }

    #[test]
    fn test_backoff_is_capped() {
        let inner = Flaky {
            failures_left: Cell::new(0),
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(inner, 50, StdDuration::from_secs(1));
        let d = api.backoff(40);
        assert!(d >= StdDuration::from_secs(30));
        assert!(d <= StdDuration::from_millis(30_250));
    }

    #[test]
    fn test_pick_model_prefers_requested() {
        let models = vec![
            model("gemini-2.0-flash", &["generateContent"]),
            model("gemini-1.5-flash", &["generateContent", "countTokens"]),
        ];
        assert_eq!(
            pick_model(&models, "gemini-1.5-flash").as_deref(),
            Some("gemini-1.5-flash")
        );
    }

    #[test]
    fn test_pick_model_falls_back_to_flash_then_any() {
        let models = vec![
            model("embedding-001", &["embedContent"]),
            model("gemini-pro", &["generateContent"]),
            model("gemini-2.5-flash", &["generateContent"]),
        ];
        assert_eq!(
            pick_model(&models, "gemini-1.5-flash").as_deref(),
            Some("gemini-2.5-flash")
        );

        let models = vec![
            model("embedding-001", &["embedContent"]),
            model("gemini-pro", &["generateContent"]),
        ];
        assert_eq!(
            pick_model(&models, "gemini-1.5-flash").as_deref(),
            Some("gemini-pro")
        );

        let models = vec![model("embedding-001", &["embedContent"])];
        assert_eq!(pick_model(&models, "gemini-1.5-flash"), None);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"**Title:** A"},{"text":"\n**Category:** Economy"}]}}]}"#;
        assert_eq!(
            extract_text(body).unwrap(),
            "**Title:** A\n**Category:** Economy"
        );
    }

    #[test]
    fn test_extract_text_errors() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let err = extract_text(body).unwrap_err();
        assert!(err.to_string().contains("API key not valid"));

        assert!(extract_text(r#"{"candidates":[]}"#).is_err());
        assert!(extract_text("not json").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let settings = ModelSettings {
            base_url: "https://example.invalid".to_string(),
            api_key: "super-secret".to_string(),
            model: "gemini-1.5-flash".to_string(),
            auto_detect: false,
            timeout: StdDuration::from_secs(1),
            max_retries: 0,
        };
        let client = GeminiClient::new(&settings).unwrap();
        let dbg = format!("{client:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(client.generate_url().ends_with("/v1beta/models/gemini-1.5-flash:generateContent"));
    }
}
