//! report-cleaner
//!
//! Internal report-distribution helper: strips the access-notice watermark
//! from PDF research reports, optionally produces a structured Chinese
//! summary through an LLM chat API (with a local heuristic fallback), and
//! emails the cleaned PDF plus summary to the configured recipient.

// Module declarations
pub mod core;
pub mod models;
pub mod pipeline;
pub mod settings;

// Re-export the public surface
pub use crate::core::email::{EmailSender, SmtpConfig};
pub use crate::core::pdf::{RemovalReport, WatermarkRemover};
pub use crate::core::summarize::{ProviderConfig, Summarizer};
pub use models::{
    PipelineConfig, RemovalMode, ReportError, SummaryResult, SummarySource, WatermarkSpec,
};
pub use pipeline::{run, PipelineReport};
pub use settings::Settings;
