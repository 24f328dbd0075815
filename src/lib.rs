//! # bloodwork-advisor
//!
//! Turn a blood test report PDF into concise, article-backed health
//! recommendations with a three-stage LLM pipeline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    text layer via pdfium, OCR fallback via tesseract
//!  ├─ 2. Analyze    LLM summary of the (truncated) report
//!  ├─ 3. Search     LLM-derived query → Google Custom Search (top 3)
//!  └─ 4. Recommend  LLM recommendations from analysis + article list
//! ```
//!
//! Stages run strictly in sequence. Any failure ends the run; there are no
//! retries and no partial results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bloodwork_advisor::{process_blood_test_report, read_pdf, AdvisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Model auto-detected from OPENAI_API_KEY / EDGEQUAKE_LLM_PROVIDER.
//!     // Search reads GOOGLE_API_KEY and GOOGLE_CSE_ID.
//!     let config = AdvisorConfig::default();
//!     let report = read_pdf("blood_test.pdf", &config).await;
//!     if let Some(advice) = process_blood_test_report(&report, &config).await {
//!         println!("{advice}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bloodwork` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## Not medical advice
//!
//! Output is generated by a language model from a partial view of the
//! report. It is not reviewed by a clinician.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod advise;
pub mod agents;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod postprocess;
pub mod progress;
pub mod prompts;
pub mod search;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use advise::{advise_file, process_blood_test_report, run_pipeline};
pub use config::{AdvisorConfig, AdvisorConfigBuilder, DEFAULT_MODEL};
pub use error::{AdvisorError, StageError};
pub use extract::{read_pdf, try_extract, DocumentExtractor, OcrEngine, PdfBackend};
pub use llm::{LanguageModel, ProviderModel};
pub use output::{Article, Extraction, ExtractionMethod, PipelineReport};
pub use pipeline::Stage;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use search::{GoogleSearch, SearchProvider};
