//! OCR: recognise text in a rasterised page with tesseract.
//!
//! Tesseract is driven as a subprocess (`tesseract <png> stdout -l <lang>`)
//! rather than linked, so the crate builds without leptonica/tesseract
//! headers. Each page is written to a temporary PNG that is removed when
//! the call returns.

use crate::error::AdvisorError;
use image::DynamicImage;
use std::io::{Cursor, Write};
use std::process::Command;
use tracing::{debug, warn};

/// Blocking text recognition for one page image.
pub trait OcrEngine: Send + Sync {
    /// Recognise the text of `image`, which is page `page` (1-indexed).
    fn recognize(&self, page: usize, image: &DynamicImage) -> Result<String, AdvisorError>;

    /// Whether the engine can run at all. Checked once before rasterising.
    fn is_available(&self) -> bool {
        true
    }
}

/// [`OcrEngine`] that shells out to the tesseract CLI.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }
}

/// Encode a page as PNG. Lossless keeps glyph edges crisp for recognition.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

impl OcrEngine for TesseractOcr {
    /// Whether the configured tesseract binary can be executed.
    fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn recognize(&self, page: usize, image: &DynamicImage) -> Result<String, AdvisorError> {
        let failed = |detail: String| AdvisorError::OcrFailed { page, detail };

        let png = encode_png(image).map_err(|e| failed(format!("PNG encoding failed: {e}")))?;
        let mut tmp = tempfile::Builder::new()
            .prefix("bloodwork-page-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| failed(format!("tempfile: {e}")))?;
        tmp.write_all(&png)
            .and_then(|_| tmp.flush())
            .map_err(|e| failed(format!("tempfile write: {e}")))?;

        let output = Command::new(&self.command)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                failed(format!(
                    "could not run '{}': {e}. Install tesseract-ocr or set the tesseract command.",
                    self.command
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("tesseract exited with {}: {}", output.status, stderr.trim())));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("Tesseract warning on page {}: {}", page, stderr.trim());
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("OCR page {}: {} chars", page, text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn missing_binary_is_ocr_failed() {
        let ocr = TesseractOcr::new("/definitely/not/tesseract", "eng");
        assert!(!ocr.is_available());
        let img = DynamicImage::new_rgb8(4, 4);
        match ocr.recognize(2, &img).unwrap_err() {
            AdvisorError::OcrFailed { page, detail } => {
                assert_eq!(page, 2);
                assert!(detail.contains("could not run"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
