use std::panic;
use std::path::Path;

use tracing::warn;

use crate::models::ReportError;

/// Extract the full text of a PDF for summarization.
///
/// Wraps the pdf-extract crate; its occasional panics on malformed
/// documents are caught and reported as read errors rather than aborting
/// the pipeline.
pub fn extract_text(path: &Path) -> Result<String, ReportError> {
    let owned = path.to_path_buf();
    let result = panic::catch_unwind(move || pdf_extract::extract_text(&owned));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ReportError::DocumentRead(format!(
            "文本提取失败 {}: {}",
            path.display(),
            e
        ))),
        Err(_) => {
            warn!(path = %path.display(), "text extraction panicked");
            Err(ReportError::DocumentRead(format!(
                "文本提取失败 {}: extractor panicked",
                path.display()
            )))
        }
    }
}
