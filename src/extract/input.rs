//! Input validation: make sure a path points at a readable PDF.
//!
//! pdfium's load errors are opaque ("FormatError") for anything that is not
//! a PDF. Checking existence, permissions and the `%PDF` magic bytes first
//! gives the caller a meaningful error instead.

use crate::error::AdvisorError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local file path, checking existence and PDF magic bytes.
pub fn validate_pdf_path(path: &Path) -> Result<PathBuf, AdvisorError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(AdvisorError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(AdvisorError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AdvisorError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(AdvisorError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
