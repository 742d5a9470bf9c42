//! Sequential processing pipeline: remove → summarize → email.
//!
//! 每个阶段只接收 `PipelineConfig` 与上一阶段的产物，不读任何全局状态；
//! 单线程顺序执行，阶段内的网络调用阻塞等待，失败不自动重试。

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::email::EmailSender;
use crate::core::pdf::{extract_text, RemovalReport, WatermarkRemover};
use crate::core::summarize::Summarizer;
use crate::models::{PipelineConfig, ReportError, SummaryResult};
use crate::settings::Settings;

/// Everything one run produced
#[derive(Debug)]
pub struct PipelineReport {
    pub removal: RemovalReport,
    /// Present when the summarize stage ran (AI or fallback)
    pub summary: Option<SummaryResult>,
    pub email_sent: bool,
    /// Final location of the cleaned PDF
    pub output: PathBuf,
}

/// Run the full pipeline once.
///
/// The cleaned PDF is written into a temporary workspace first and copied
/// to `config.output` only after removal succeeds, so a failing run never
/// leaves a half-written output file. A later email failure does not undo
/// the already-written PDF.
pub fn run(config: &PipelineConfig, settings: &Settings) -> Result<PipelineReport, ReportError> {
    if !config.input.exists() {
        return Err(ReportError::DocumentRead(format!(
            "输入文件不存在: {}",
            config.input.display()
        )));
    }
    let original_filename = config
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("report.pdf")
        .to_string();

    // ─── Step 1: 去水印（临时工作区 → 拷贝到输出路径）─────────────────────
    let workspace = tempfile::Builder::new()
        .prefix("report_cleaner_")
        .tempdir()?;
    let staged = workspace.path().join(&original_filename);

    let remover = WatermarkRemover::new(config.watermark.clone())?;
    let removal = remover.remove(&config.input, &staged)?;
    info!(
        removed = removal.occurrences_removed,
        pages = removal.pages_modified,
        "watermark removal finished"
    );

    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::copy(&staged, &config.output)?;

    // ─── Step 2: AI 摘要（可选；任何失败都退化为本地兜底）──────────────────
    let summary = if config.summarize {
        match extract_text(&config.input) {
            Ok(text) => {
                let summarizer = Summarizer::new(settings.providers.clone())?;
                Some(summarizer.summarize(&text))
            }
            Err(e) => {
                // 提取不到文本（扫描件等）：跳过摘要，仅分发 PDF
                warn!(error = %e, "text extraction failed, skipping summary");
                None
            }
        }
    } else {
        None
    };

    // ─── Step 3: 邮件分发（可选）──────────────────────────────────────────
    let mut email_sent = false;
    if let Some(recipient) = config.recipient.as_deref().filter(|r| !r.trim().is_empty()) {
        if !settings.smtp.is_configured() {
            return Err(ReportError::Delivery(
                "SMTP 凭据未配置，无法发送邮件".to_string(),
            ));
        }
        let sender = EmailSender::new(settings.smtp.clone());
        sender.send_report(recipient, &config.output, summary.as_ref(), &original_filename)?;
        email_sent = true;
    }

    Ok(PipelineReport {
        removal,
        summary,
        email_sent,
        output: config.output.clone(),
    })
}
