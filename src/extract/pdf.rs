//! PDF access: read text layers and rasterise pages via pdfium.
//!
//! The [`PdfBackend`] trait is the seam the extractor depends on; the
//! production implementation is [`PdfiumBackend`]. Every method is blocking:
//! pdfium wraps a C++ library with thread-local state, so callers run it
//! inside `tokio::task::spawn_blocking`.
//!
//! ## Locating pdfium
//!
//! `PDFIUM_LIB_PATH` may name the library file or the directory holding it.
//! Without it the platform's system library search path is used.

use crate::error::AdvisorError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Blocking access to the pages of a PDF.
pub trait PdfBackend: Send + Sync {
    /// Text layer of every page, in page order. Pages without text yield "".
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, AdvisorError>;

    /// Every page rasterised to an image, in page order.
    fn render_pages(&self, path: &Path) -> Result<Vec<DynamicImage>, AdvisorError>;
}

/// [`PdfBackend`] backed by pdfium-render.
#[derive(Debug, Clone)]
pub struct PdfiumBackend {
    dpi: u32,
    max_rendered_pixels: u32,
}

impl PdfiumBackend {
    pub fn new(dpi: u32, max_rendered_pixels: u32) -> Self {
        Self {
            dpi,
            max_rendered_pixels,
        }
    }
}

/// Bind to the pdfium shared library.
pub fn bind_pdfium() -> Result<Pdfium, AdvisorError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = PathBuf::from(&p);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AdvisorError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

fn load<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, AdvisorError> {
    pdfium.load_pdf_from_file(path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            AdvisorError::PasswordRequired {
                path: path.to_path_buf(),
            }
        } else {
            AdvisorError::CorruptPdf {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Pixel width for a page `width_pts` wide at `dpi`, capped at `max_pixels`.
pub fn target_width(width_pts: f32, dpi: u32, max_pixels: u32) -> i32 {
    let px = (width_pts * dpi as f32 / 72.0).round().max(1.0) as u32;
    px.min(max_pixels) as i32
}

impl PdfBackend for PdfiumBackend {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, AdvisorError> {
        let pdfium = bind_pdfium()?;
        let document = load(&pdfium, path)?;
        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| AdvisorError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("page {}: {:?}", idx + 1, e),
                })?
                .all();
            debug!("Page {}: {} chars of text layer", idx + 1, text.len());
            texts.push(text);
        }
        Ok(texts)
    }

    fn render_pages(&self, path: &Path) -> Result<Vec<DynamicImage>, AdvisorError> {
        let pdfium = bind_pdfium()?;
        let document = load(&pdfium, path)?;
        let pages = document.pages();

        let mut images = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let width = target_width(page.width().value, self.dpi, self.max_rendered_pixels);
            let render_config = PdfRenderConfig::new()
                .set_target_width(width)
                .set_maximum_height(self.max_rendered_pixels as i32);

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                AdvisorError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_at_300_dpi() {
        // 8.5in × 72pt = 612pt
        assert_eq!(target_width(612.0, 300, 4000), 2550);
    }

    #[test]
    fn width_is_capped() {
        assert_eq!(target_width(2384.0, 300, 4000), 4000);
    }

    #[test]
    fn degenerate_page_gets_one_pixel() {
        assert_eq!(target_width(0.0, 300, 4000), 1);
    }
}
