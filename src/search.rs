//! Web search: the [`SearchProvider`] seam and the Google Custom Search client.
//!
//! The pipeline only needs "query in, ranked `(title, link)` pairs out".
//! Ranking, deduplication and relevance are whatever the provider returns.

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::output::Article;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Google Custom Search JSON API endpoint.
pub const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `num_results` hits for `query`, in provider order.
    ///
    /// Fewer hits (including none) is a valid answer, not an error.
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<Article>, AdvisorError>;
}

/// Google Custom Search client.
pub struct GoogleSearch {
    client: reqwest::Client,
    api_key: String,
    cse_id: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

impl GoogleSearch {
    pub fn new(
        api_key: impl Into<String>,
        cse_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, AdvisorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AdvisorError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            cse_id: cse_id.into(),
            endpoint: GOOGLE_CSE_ENDPOINT.to_string(),
        })
    }

    /// Build from `GOOGLE_API_KEY` / `GOOGLE_CSE_ID`.
    ///
    /// Missing variables are not an error here: the first search request
    /// fails instead.
    pub fn from_env(timeout_secs: u64) -> Result<Self, AdvisorError> {
        let api_key = std::env::var("GOOGLE_API_KEY").unwrap_or_default();
        let cse_id = std::env::var("GOOGLE_CSE_ID").unwrap_or_default();
        Self::new(api_key, cse_id, timeout_secs)
    }

    /// Point the client at a different endpoint (proxies, test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<Article>, AdvisorError> {
        let failed = |reason: String| AdvisorError::SearchFailed {
            query: query.to_string(),
            reason,
        };

        // The request URL carries the API key; errors are reported without it.
        let num = num_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| failed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.chars().take(200).collect();
            return Err(failed(format!("HTTP {status}: {detail}")));
        }

        let body: CseResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {}", e.without_url())))?;

        let articles: Vec<Article> = body
            .items
            .into_iter()
            .take(num_results)
            .map(|item| Article {
                title: item.title,
                link: item.link,
            })
            .collect();

        debug!("Search '{}' returned {} hits", query, articles.len());
        Ok(articles)
    }
}

/// Resolve the search provider: the injected one, else Google from env.
pub fn resolve_search(config: &AdvisorConfig) -> Result<Arc<dyn SearchProvider>, AdvisorError> {
    if let Some(ref search) = config.search {
        return Ok(Arc::clone(search));
    }
    info!("Using Google Custom Search");
    Ok(Arc::new(GoogleSearch::from_env(config.search_timeout_secs)?))
}
