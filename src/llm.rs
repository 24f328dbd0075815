//! Language-model access: the [`LanguageModel`] seam and its provider adapter.
//!
//! Stages talk to a `LanguageModel`, never to an `edgequake-llm` provider
//! directly. [`ProviderModel`] is the production implementation: it wraps an
//! `Arc<dyn LLMProvider>`, sends a system + user message pair, and enforces
//! the per-request timeout. Tests substitute a deterministic stub.

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// A single-turn text generator.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable identifier used in logs.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt` under the `system` instructions.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, AdvisorError>;
}

/// [`LanguageModel`] backed by an `edgequake-llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &AdvisorConfig) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LanguageModel for ProviderModel {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, AdvisorError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];
        let options = self.options();
        let start = Instant::now();

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| AdvisorError::ApiTimeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            })?
            .map_err(|e| AdvisorError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Resolve the model seam for a run, from most-specific to least-specific.
///
/// 1. `config.language_model`: used as-is.
/// 2. Anything [`resolve_provider`] can build, wrapped in [`ProviderModel`].
pub fn resolve_model(config: &AdvisorConfig) -> Result<Arc<dyn LanguageModel>, AdvisorError> {
    if let Some(ref model) = config.language_model {
        return Ok(Arc::clone(model));
    }
    let (provider, label) = resolve_provider(config)?;
    Ok(Arc::new(ProviderModel::new(provider, label, config)))
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<(Arc<dyn LLMProvider>, String), AdvisorError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AdvisorError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok((provider, format!("{provider_name}/{model}")))
}

/// Resolve the LLM provider.
///
/// 1. **Pre-built provider** (`config.provider`).
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// The API key itself is not checked here; a missing or bad key surfaces on
/// the first model call.
pub fn resolve_provider(
    config: &AdvisorConfig,
) -> Result<(Arc<dyn LLMProvider>, String), AdvisorError> {
    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), config.model_or_default().to_string()));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AdvisorError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}
