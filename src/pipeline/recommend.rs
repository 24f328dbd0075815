//! Recommendation stage: one model call over analysis + articles.

use crate::agents::Task;
use crate::error::AdvisorError;
use crate::llm::LanguageModel;
use crate::postprocess::clean_model_output;
use crate::prompts::recommendation_prompt;
use tracing::info;

pub async fn generate_recommendations(
    model: &dyn LanguageModel,
    task: &Task,
    analysis: &str,
    articles: &str,
) -> Result<String, AdvisorError> {
    info!("Generating health recommendations");
    let answer = model
        .generate(&task.system_prompt(), &recommendation_prompt(analysis, articles))
        .await?;
    Ok(clean_model_output(&answer))
}
