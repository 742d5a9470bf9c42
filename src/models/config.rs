use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Built-in watermark notices removed when the caller does not supply any.
///
/// 与生产流程一致：国泰君安研报固定携带这两种水印（英文/中文各一）。
pub const DEFAULT_WATERMARKS: [&str; 2] = [
    "For the exclusive use of DAPHNE.WOO@GTJAS.COM.HK",
    "本文件专供 Guotai Junan Investments (Hong Kong) Limited 的 Daisy Zhu 使用",
];

/// How watermark removal proceeds when the text pass finds nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalMode {
    /// Only delete matching text runs from page content streams
    TextOnly,
    /// Text pass first; if no run matches, fall back to the image heuristic
    /// over embedded page images
    TextThenImage,
}

/// Watermark removal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkSpec {
    /// Literal strings to remove (case-sensitive; matched exact or
    /// whitespace-normalized)
    pub patterns: Vec<String>,
    /// Removal strategy
    pub mode: RemovalMode,
}

impl WatermarkSpec {
    /// Spec matching every built-in watermark notice, text mode only
    pub fn builtin() -> Self {
        Self {
            patterns: DEFAULT_WATERMARKS.iter().map(|s| s.to_string()).collect(),
            mode: RemovalMode::TextOnly,
        }
    }

    /// Spec for a single caller-supplied watermark string
    pub fn single(pattern: impl Into<String>) -> Self {
        Self {
            patterns: vec![pattern.into()],
            mode: RemovalMode::TextOnly,
        }
    }

    pub fn with_mode(mut self, mode: RemovalMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Explicit per-run configuration passed into every pipeline stage.
///
/// Replaces the original GUI's shared window/session globals: each stage
/// receives this value and nothing else carries state between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Source PDF (never modified)
    pub input: PathBuf,
    /// Destination for the cleaned PDF
    pub output: PathBuf,
    pub watermark: WatermarkSpec,
    /// Recipient address; `None` skips the email stage
    #[serde(default)]
    pub recipient: Option<String>,
    /// Run the AI summarization stage
    #[serde(default)]
    pub summarize: bool,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            watermark: WatermarkSpec::builtin(),
            recipient: None,
            summarize: false,
        }
    }

    /// Default output path next to the input: `report.pdf` → `report_clean.pdf`
    pub fn default_output_for(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let name = format!("{}_clean.pdf", stem);
        match input.parent() {
            Some(p) => p.join(name),
            None => PathBuf::from(name),
        }
    }
}
