//! Search stage: turn the analysis into a query and fetch a few articles.

use crate::agents::Task;
use crate::error::AdvisorError;
use crate::llm::LanguageModel;
use crate::output::Article;
use crate::postprocess::clean_model_output;
use crate::prompts::search_query_prompt;
use crate::search::SearchProvider;
use tracing::{info, warn};

/// Longest query sent to the search provider, in characters.
pub const MAX_QUERY_CHARS: usize = 256;

/// Ask the search agent for a query describing the analysis.
pub async fn derive_search_query(
    model: &dyn LanguageModel,
    task: &Task,
    analysis: &str,
) -> Result<String, AdvisorError> {
    let reply = model
        .generate(&task.system_prompt(), &search_query_prompt(analysis))
        .await?;
    Ok(clean_query(&reply, analysis))
}

/// Reduce a model reply to a single query line.
///
/// Takes the first non-empty line, strips surrounding quotes and caps the
/// length. An empty reply falls back to the head of the analysis.
pub fn clean_query(reply: &str, analysis: &str) -> String {
    let cleaned = clean_model_output(reply);
    let line = cleaned
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();

    let source = if line.is_empty() {
        warn!("Search agent returned no query; falling back to the analysis text");
        analysis.trim()
    } else {
        line
    };
    source.chars().take(MAX_QUERY_CHARS).collect()
}

/// Fetch up to `num_results` articles for `query`.
pub async fn search_health_articles(
    provider: &dyn SearchProvider,
    query: &str,
    num_results: usize,
) -> Result<Vec<Article>, AdvisorError> {
    info!("Searching for health articles: {}", query);
    let mut hits = provider.search(query, num_results).await?;
    hits.truncate(num_results);
    if hits.len() < num_results {
        info!("Search returned {} of {} requested articles", hits.len(), num_results);
    }
    Ok(hits)
}

/// Render hits as one `"{title}: {link}"` line each.
pub fn format_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|a| format!("{}: {}", a.title, a.link))
        .collect::<Vec<_>>()
        .join("\n")
}
