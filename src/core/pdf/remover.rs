use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};
use tracing::{debug, info, warn};

use crate::core::pdf::images::ImageCleaner;
use crate::models::{RemovalMode, ReportError, WatermarkSpec};

/// 水印移除流水线
///
/// ## 流程
///
/// 1. 打开 PDF（加密文档直接拒绝，不尝试解密）
/// 2. 文本模式：逐页解码内容流，删除与任一水印串匹配的文本运算符
///    （`Tj` / `'` / `"` / `TJ`），其余运算符原样保留
/// 3. 未命中且配置了图像模式时：对页面内嵌图片执行固定阈值的
///    水印区域覆盖（见 `images.rs`）
/// 4. 无论是否命中，都写出新文件；原文件永不修改
pub struct WatermarkRemover {
    spec: WatermarkSpec,
}

/// Outcome of one removal run
#[derive(Debug, Clone)]
pub struct RemovalReport {
    /// Text runs deleted across all pages
    pub occurrences_removed: usize,
    /// Pages whose content stream changed
    pub pages_modified: usize,
    /// Whether the image-heuristic pass ran
    pub image_pass_ran: bool,
    /// Image regions painted over by the image pass
    pub image_regions_painted: usize,
}

impl RemovalReport {
    /// The informational no-watermark-found condition: nothing matched in
    /// either pass. The output file is written regardless.
    pub fn nothing_found(&self) -> bool {
        self.occurrences_removed == 0 && self.image_regions_painted == 0
    }
}

impl WatermarkRemover {
    pub fn new(spec: WatermarkSpec) -> Result<Self, ReportError> {
        if spec.patterns.is_empty() {
            return Err(ReportError::InvalidConfig(
                "watermark pattern list is empty".to_string(),
            ));
        }
        if spec.patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ReportError::InvalidConfig(
                "watermark pattern must not be blank".to_string(),
            ));
        }
        Ok(Self { spec })
    }

    /// Remove all configured watermarks from `input`, writing the cleaned
    /// document to `output`. Always writes `output`, even when no watermark
    /// was found (the no-op case preserves the document content unchanged).
    pub fn remove(&self, input: &Path, output: &Path) -> Result<RemovalReport, ReportError> {
        let mut doc = Document::load(input).map_err(|e| {
            ReportError::DocumentRead(format!("无法打开 PDF {}: {}", input.display(), e))
        })?;

        if doc.is_encrypted() {
            return Err(ReportError::DocumentRead(format!(
                "PDF 已加密，无法处理: {}",
                input.display()
            )));
        }

        let mut report = RemovalReport {
            occurrences_removed: 0,
            pages_modified: 0,
            image_pass_ran: false,
            image_regions_painted: 0,
        };

        // ─── 文本模式：逐页删除匹配的文本运算符 ─────────────────────────────
        let pages: Vec<(u32, (u32, u16))> = doc.get_pages().into_iter().collect();
        for (page_num, page_id) in &pages {
            let removed = self.clean_page(&mut doc, *page_id)?;
            if removed > 0 {
                info!(page = page_num, removed, "watermark text removed");
                report.occurrences_removed += removed;
                report.pages_modified += 1;
            }
        }

        // ─── 图像模式回退：文本未命中时处理内嵌图片 ─────────────────────────
        if report.occurrences_removed == 0 && self.spec.mode == RemovalMode::TextThenImage {
            debug!("text pass found nothing, running image heuristic");
            report.image_pass_ran = true;
            let cleaner = ImageCleaner::new();
            for (page_num, page_id) in &pages {
                let painted = cleaner.clean_page_images(&mut doc, *page_id)?;
                if painted > 0 {
                    info!(page = page_num, painted, "image watermark region painted");
                    report.image_regions_painted += painted;
                    report.pages_modified += 1;
                }
            }
        }

        if report.nothing_found() {
            // 未找到任何水印：非致命，照常写出（内容与输入一致）
            warn!(input = %input.display(), "no watermark found in document");
        }

        doc.save(output)?;
        Ok(report)
    }

    /// Delete matching text operators from one page. Returns how many were
    /// removed; the content stream is only rewritten when something matched.
    fn clean_page(&self, doc: &mut Document, page_id: (u32, u16)) -> Result<usize, ReportError> {
        let content = doc.get_and_decode_page_content(page_id)?;

        // Font resource name → encoding, resolved up front so the borrow on
        // `doc` ends before we rewrite the stream.
        let encodings: BTreeMap<Vec<u8>, String> = doc
            .get_page_fonts(page_id)
            .into_iter()
            .map(|(name, font)| (name, font.get_font_encoding().to_string()))
            .collect();

        let mut current_encoding: Option<String> = None;
        let mut kept: Vec<Operation> = Vec::with_capacity(content.operations.len());
        let mut removed = 0usize;

        for op in content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        current_encoding = encodings.get(name).cloned();
                    }
                    kept.push(op);
                }
                "Tj" | "'" | "\"" | "TJ" => {
                    let text = decode_text_operands(&op, current_encoding.as_deref());
                    if matches_any(&text, &self.spec.patterns) {
                        removed += 1;
                    } else {
                        kept.push(op);
                    }
                }
                _ => kept.push(op),
            }
        }

        if removed > 0 {
            let cleaned = Content { operations: kept };
            doc.change_page_content(page_id, cleaned.encode()?)?;
        }
        Ok(removed)
    }
}

/// Decode the shown text of a text-showing operator.
///
/// `Tj` and `'` carry one string operand, `"` carries (aw, ac, string), and
/// `TJ` carries an array interleaving strings with kerning numbers; the
/// string elements are concatenated, kerning is ignored.
pub(crate) fn decode_text_operands(op: &Operation, encoding: Option<&str>) -> String {
    let mut text = String::new();
    let operands: &[Object] = match op.operator.as_str() {
        // 前两个操作数是字间距/字符间距，文本在第三个
        "\"" => op.operands.get(2..).unwrap_or(&[]),
        _ => &op.operands,
    };
    for operand in operands {
        match operand {
            Object::String(bytes, _) => {
                text.push_str(&Document::decode_text(encoding, bytes));
            }
            Object::Array(elements) => {
                for element in elements {
                    if let Object::String(bytes, _) = element {
                        text.push_str(&Document::decode_text(encoding, bytes));
                    }
                }
            }
            _ => {}
        }
    }
    text
}

/// Exact or whitespace-normalized match of any pattern inside a text run.
///
/// Containment counts as a match: a run that glues the watermark together
/// with surrounding spacing is still a watermark run, and the contract is
/// that no extracted text may contain the pattern afterwards.
pub(crate) fn matches_any(text: &str, patterns: &[String]) -> bool {
    if text.is_empty() {
        return false;
    }
    let normalized = normalize_ws(text);
    patterns.iter().any(|pattern| {
        text.contains(pattern.as_str()) || normalized.contains(&normalize_ws(pattern))
    })
}

/// Collapse every whitespace run to a single space and trim
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
