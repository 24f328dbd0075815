//! Configuration for extraction and the advice pipeline.
//!
//! Every knob lives in [`AdvisorConfig`], built via [`AdvisorConfigBuilder`].
//! The config is constructed once at start-up and passed by reference into
//! each stage; there are no module-level clients.

use crate::error::AdvisorError;
use crate::llm::LanguageModel;
use crate::progress::PipelineProgressCallback;
use crate::search::SearchProvider;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for one advice run.
///
/// # Example
/// ```rust
/// use bloodwork_advisor::AdvisorConfig;
///
/// let config = AdvisorConfig::builder()
///     .model("gpt-4.1-mini")
///     .num_search_results(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.report_excerpt_chars, Some(1000));
/// ```
#[derive(Clone)]
pub struct AdvisorConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed model seam. Takes precedence over every provider field.
    pub language_model: Option<Arc<dyn LanguageModel>>,

    /// Pre-constructed search provider. If None, Google Custom Search is
    /// built from `GOOGLE_API_KEY` / `GOOGLE_CSE_ID`.
    pub search: Option<Arc<dyn SearchProvider>>,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens per model answer. Default: 1024.
    pub max_tokens: usize,

    /// Per-model-call timeout in seconds. Default: 300.
    pub api_timeout_secs: u64,

    /// End-to-end budget for the three stages in seconds. Default: 1800.
    pub pipeline_timeout_secs: u64,

    /// Characters of the report handed to the analysis stage. Default: 1000.
    ///
    /// `None` sends the whole report.
    pub report_excerpt_chars: Option<usize>,

    /// Search hits requested from the provider. Range: 1–10. Default: 3.
    pub num_search_results: usize,

    /// Timeout of a single search request in seconds. Default: 30.
    pub search_timeout_secs: u64,

    /// Tesseract language code. Default: "eng".
    pub ocr_language: String,

    /// Tesseract executable. Default: "tesseract".
    pub tesseract_cmd: String,

    /// Rasterisation DPI for OCR. Range: 72–600. Default: 300.
    pub ocr_dpi: u32,

    /// Cap on the rendered page width in pixels. Default: 4000.
    pub max_rendered_pixels: u32,

    /// Optional stage progress callback.
    pub progress_callback: Option<Arc<dyn PipelineProgressCallback>>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            language_model: None,
            search: None,
            temperature: 0.7,
            max_tokens: 1024,
            api_timeout_secs: 300,
            pipeline_timeout_secs: 1800,
            report_excerpt_chars: Some(1000),
            num_search_results: 3,
            search_timeout_secs: 30,
            ocr_language: "eng".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            ocr_dpi: 300,
            max_rendered_pixels: 4000,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "language_model",
                &self.language_model.as_ref().map(|m| m.name().to_string()),
            )
            .field("search", &self.search.as_ref().map(|_| "<dyn SearchProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pipeline_timeout_secs", &self.pipeline_timeout_secs)
            .field("report_excerpt_chars", &self.report_excerpt_chars)
            .field("num_search_results", &self.num_search_results)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_dpi", &self.ocr_dpi)
            .finish()
    }
}

impl AdvisorConfig {
    /// Create a new builder for `AdvisorConfig`.
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model id to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`AdvisorConfig`].
pub struct AdvisorConfigBuilder {
    config: AdvisorConfig,
}

impl AdvisorConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.config.language_model = Some(model);
        self
    }

    pub fn search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.config.search = Some(search);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pipeline_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pipeline_timeout_secs = secs;
        self
    }

    pub fn report_excerpt_chars(mut self, chars: Option<usize>) -> Self {
        self.config.report_excerpt_chars = chars;
        self
    }

    pub fn num_search_results(mut self, n: usize) -> Self {
        self.config.num_search_results = n;
        self
    }

    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search_timeout_secs = secs;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn PipelineProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AdvisorConfig, AdvisorError> {
        let c = &self.config;
        if !(1..=10).contains(&c.num_search_results) {
            return Err(AdvisorError::InvalidConfig(format!(
                "num_search_results must be 1–10, got {}",
                c.num_search_results
            )));
        }
        if !(72..=600).contains(&c.ocr_dpi) {
            return Err(AdvisorError::InvalidConfig(format!(
                "OCR DPI must be 72–600, got {}",
                c.ocr_dpi
            )));
        }
        if c.api_timeout_secs == 0 || c.pipeline_timeout_secs == 0 {
            return Err(AdvisorError::InvalidConfig(
                "Timeouts must be at least 1 second".into(),
            ));
        }
        if c.report_excerpt_chars == Some(0) {
            return Err(AdvisorError::InvalidConfig(
                "report_excerpt_chars must be ≥ 1 (use None for the full report)".into(),
            ));
        }
        if c.tesseract_cmd.trim().is_empty() {
            return Err(AdvisorError::InvalidConfig(
                "tesseract_cmd must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
