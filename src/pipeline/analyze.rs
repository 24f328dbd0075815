//! Analysis stage: summarise abnormal findings in the report.
//!
//! Only the first `report_excerpt_chars` characters reach the model. Long
//! multi-page reports lose their tail; set the limit to `None` to send
//! everything.

use crate::agents::Task;
use crate::error::AdvisorError;
use crate::llm::LanguageModel;
use crate::postprocess::clean_model_output;
use crate::prompts::{analysis_prompt, ANALYSIS_PREFIX};
use tracing::{debug, info};

/// First `limit` characters of `report`, cut on a char boundary.
pub fn report_excerpt(report: &str, limit: Option<usize>) -> &str {
    match limit {
        Some(n) => match report.char_indices().nth(n) {
            Some((byte_idx, _)) => &report[..byte_idx],
            None => report,
        },
        None => report,
    }
}

/// Run the analysis task and return `"Analysis of blood test report: …"`.
pub async fn analyze_blood_test(
    model: &dyn LanguageModel,
    task: &Task,
    excerpt: &str,
) -> Result<String, AdvisorError> {
    info!("Analyzing blood test report");
    debug!("Report excerpt: {} chars", excerpt.chars().count());

    let answer = model
        .generate(&task.system_prompt(), &analysis_prompt(excerpt))
        .await?;
    Ok(format!("{ANALYSIS_PREFIX}{}", clean_model_output(&answer)))
}
