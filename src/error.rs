//! Error types for the bloodwork-advisor library.
//!
//! Two types reflect the two places a run can go wrong:
//!
//! * [`AdvisorError`]: anything that stops the current invocation: an
//!   unreadable report, a missing pdfium library, a failed model or search
//!   call, a blown timeout.
//!
//! * [`StageError`]: wraps an [`AdvisorError`] raised inside one pipeline
//!   stage and records which stage it was, so the driver can report
//!   "search stage failed: …" instead of a bare HTTP error.
//!
//! Nothing is retried. Every error is terminal for the invocation.

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the bloodwork-advisor library.
#[derive(Debug, Error)]
pub enum AdvisorError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF is encrypted; reports are expected to open without a password.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// pdfium-render failed to rasterise a page for OCR.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, or set PDFIUM_LIB_PATH to the\n\
directory (or file) containing it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine could not be run or exited with an error.
    #[error("OCR failed on page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// Neither the text layer nor OCR produced any text.
    #[error("No text could be extracted from '{path}'")]
    NoTextExtracted { path: PathBuf },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// A single model call exceeded the per-request timeout.
    #[error("LLM call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    // ── Search errors ─────────────────────────────────────────────────────
    /// The web search request failed or returned a non-success status.
    #[error("Web search for '{query}' failed: {reason}")]
    SearchFailed { query: String, reason: String },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// A pipeline stage failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// The whole pipeline exceeded its end-to-end budget.
    #[error("Pipeline did not finish within {secs}s")]
    PipelineTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// An [`AdvisorError`] tagged with the pipeline stage that raised it.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: Box<AdvisorError>,
}

impl StageError {
    pub fn new(stage: Stage, source: AdvisorError) -> Self {
        Self {
            stage,
            source: Box::new(source),
        }
    }
}

impl AdvisorError {
    /// The stage that failed, if this error came out of the pipeline driver.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AdvisorError::Stage(e) => Some(e.stage),
            _ => None,
        }
    }
}
