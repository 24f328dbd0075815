//! Document extraction: PDF path → plain text.
//!
//! ```text
//! path ──▶ validate ──▶ text layer ──(empty?)──▶ rasterise ──▶ OCR
//!          (%PDF)       (pdfium)                 (pdfium)      (tesseract)
//! ```
//!
//! 1. [`input`]: existence, permission and magic-byte checks
//! 2. [`pdf`]  : text layers and page rasters through a [`PdfBackend`]
//! 3. [`ocr`]  : per-page recognition through an [`OcrEngine`]
//!
//! OCR only runs when the concatenated text layer is empty or whitespace.
//! Page texts are concatenated in page order and returned as-is.
//! pdfium and tesseract block, so both paths run in `spawn_blocking`.

pub mod input;
pub mod ocr;
pub mod pdf;

pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::{PdfBackend, PdfiumBackend};

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::output::{Extraction, ExtractionMethod};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Extracts report text, falling back to OCR for image-only PDFs.
#[derive(Clone)]
pub struct DocumentExtractor {
    backend: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrEngine>,
}

impl DocumentExtractor {
    pub fn new(backend: Arc<dyn PdfBackend>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { backend, ocr }
    }

    /// pdfium + tesseract, configured from `config`.
    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(
            Arc::new(PdfiumBackend::new(config.ocr_dpi, config.max_rendered_pixels)),
            Arc::new(TesseractOcr::new(
                config.tesseract_cmd.clone(),
                config.ocr_language.clone(),
            )),
        )
    }

    /// Extract the text of the PDF at `path`.
    pub async fn extract(&self, path: &Path) -> Result<Extraction, AdvisorError> {
        let path = input::validate_pdf_path(path)?;
        info!("Starting to read PDF: {}", path.display());

        let backend = Arc::clone(&self.backend);
        let text_path = path.clone();
        let texts = tokio::task::spawn_blocking(move || backend.page_texts(&text_path))
            .await
            .map_err(|e| AdvisorError::Internal(format!("Text extraction task panicked: {}", e)))??;

        let page_count = texts.len();
        let text = texts.concat();
        if !text.trim().is_empty() {
            info!("PDF reading completed: {} chars from text layer", text.len());
            return Ok(Extraction {
                text,
                method: ExtractionMethod::TextLayer,
                page_count,
            });
        }

        info!("No text extracted, attempting OCR");
        let backend = Arc::clone(&self.backend);
        let ocr = Arc::clone(&self.ocr);
        let ocr_text = tokio::task::spawn_blocking(move || -> Result<String, AdvisorError> {
            if !ocr.is_available() {
                warn!("OCR engine is not available; page recognition will likely fail");
            }
            let images = backend.render_pages(&path)?;
            let mut out = String::new();
            for (idx, image) in images.iter().enumerate() {
                out.push_str(&ocr.recognize(idx + 1, image)?);
            }
            Ok(out)
        })
        .await
        .map_err(|e| AdvisorError::Internal(format!("OCR task panicked: {}", e)))??;

        info!("PDF reading completed: {} chars from OCR", ocr_text.len());
        Ok(Extraction {
            text: ocr_text,
            method: ExtractionMethod::Ocr,
            page_count,
        })
    }
}

/// Fallible extraction with the pdfium + tesseract stack from `config`.
pub async fn try_extract(
    path: impl AsRef<Path>,
    config: &AdvisorConfig,
) -> Result<Extraction, AdvisorError> {
    DocumentExtractor::from_config(config)
        .extract(path.as_ref())
        .await
}

/// Extract report text, returning `""` on any failure.
///
/// The error is logged here; callers only see the empty string.
pub async fn read_pdf(path: impl AsRef<Path>, config: &AdvisorConfig) -> String {
    read_with(&DocumentExtractor::from_config(config), path.as_ref()).await
}

/// [`read_pdf`] with a caller-supplied extractor.
pub async fn read_with(extractor: &DocumentExtractor, path: &Path) -> String {
    match extractor.extract(path).await {
        Ok(extraction) => extraction.text,
        Err(e) => {
            error!("An error occurred while reading the PDF: {}", e);
            String::new()
        }
    }
}
