//! User prompts for the three model calls.
//!
//! Keeping every prompt here means a wording change touches exactly one file,
//! and unit tests can inspect prompt construction without a model.
//! The system side of each call comes from the agent persona in
//! [`crate::agents`].

/// Marker appended after the report excerpt.
pub const EXCERPT_ELLIPSIS: &str = "...";

/// Prefix the analysis stage puts in front of the model's answer.
pub const ANALYSIS_PREFIX: &str = "Analysis of blood test report: ";

/// Prompt for the analysis stage.
pub fn analysis_prompt(excerpt: &str) -> String {
    format!(
        "Analyze this blood test report and provide a summary of key findings: {excerpt}{EXCERPT_ELLIPSIS}"
    )
}

/// Prompt asking the search agent for a web query.
pub fn search_query_prompt(analysis: &str) -> String {
    format!(
        "Write one short web search query (at most 12 words) that would find \
reputable health articles about the abnormal findings in this analysis. \
Reply with the query only.\n\n{analysis}"
    )
}

/// Prompt for the recommendation stage.
///
/// A pure function of its two inputs: the same analysis and article list
/// always produce the same prompt.
pub fn recommendation_prompt(analysis: &str, articles: &str) -> String {
    format!(
        "Based on this analysis: {analysis}\nAnd these articles: {articles}\nProvide concise health recommendations:"
    )
}
