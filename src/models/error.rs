use thiserror::Error;

/// Custom error types for the report cleaner
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Document read error: {0}")]
    DocumentRead(String),

    #[error("PDF parse error: {0}")]
    PdfParse(#[from] lopdf::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Email delivery error: {0}")]
    Delivery(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
