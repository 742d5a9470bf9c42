//! Table-based HTML rendering for the summary email body.
//!
//! 收件方使用老版本 Lotus Notes 客户端，只认表格布局 + 内联 CSS：
//! 不能用 flex/grid，不能用外链样式，列表也用表格行模拟。
//! 这里的标记结构是兼容性约束，不是排版偏好。

use crate::models::SummaryResult;

/// Render the full email body: summary sections (when present) followed by
/// the attachment notice row.
pub fn render_email_html(summary: Option<&SummaryResult>, filename: &str) -> String {
    let inner = match summary {
        Some(s) if !s.is_empty() => render_summary_sections(s),
        _ => render_no_summary_notice(),
    };

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
</head>
<body style="font-family: Arial, sans-serif; margin: 0; padding: 0; color: #333;">
    <table width="100%" cellpadding="0" cellspacing="0" border="0">
        <tr>
            <td style="padding: 20px;">
{}
                <table width="100%" cellpadding="10" cellspacing="0" border="0" bgcolor="#f0f0f0">
                    <tr>
                        <td style="font-size: 12px; color: #666;">
                            附件: {}
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>
"##,
        inner,
        escape(filename)
    )
}

/// One boxed table per non-empty summary section
fn render_summary_sections(summary: &SummaryResult) -> String {
    summary
        .sections()
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(title, items)| render_section(title, items))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_section(title: &str, items: &[String]) -> String {
    let rows: String = items
        .iter()
        .map(|item| {
            format!(
                r#"                <table width="100%" cellpadding="5" cellspacing="0" border="0">
                    <tr>
                        <td style="padding-left: 20px; line-height: 1.4;">
                            • {}
                        </td>
                    </tr>
                </table>
"#,
                escape(item)
            )
        })
        .collect();

    format!(
        r##"                <table width="100%" cellpadding="15" cellspacing="0" border="0" bgcolor="#f9f9f9" style="margin-bottom: 20px; border: 1px solid #ccc;">
                    <tr>
                        <td>
                            <table width="100%" cellpadding="0" cellspacing="0" border="0">
                                <tr>
                                    <td style="font-size: 18px; font-weight: bold; color: #333; border-bottom: 2px solid #333; padding-bottom: 5px;">
                                        {}
                                    </td>
                                </tr>
                                <tr>
                                    <td style="padding-top: 10px;">
{}                                    </td>
                                </tr>
                            </table>
                        </td>
                    </tr>
                </table>
"##,
        escape(title),
        rows
    )
}

fn render_no_summary_notice() -> String {
    r##"                <table width="100%" cellpadding="15" cellspacing="0" border="0" bgcolor="#f9f9f9" style="margin-bottom: 20px; border: 1px solid #ccc;">
                    <tr>
                        <td style="line-height: 1.4;">
                            研报原文见附件，本次未生成 AI 摘要。
                        </td>
                    </tr>
                </table>
"##
    .to_string()
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).to_string()
}
