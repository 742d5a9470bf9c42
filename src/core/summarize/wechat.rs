use tracing::{info, warn};

use super::{fallback, truncate_utf8, Summarizer};

/// 微信分享摘要的最大长度（字符数，非字节）
pub const WECHAT_MAX_CHARS: usize = 300;

/// 分享卡片提示词：来源机构 + 核心结论 + 2-3 个支撑论据，
/// 删除风险提示与免责声明等冗余内容。
fn wechat_prompt(text: &str, filename: &str, max_chars: usize) -> String {
    let (body, truncated) = truncate_utf8(text, max_chars);
    let marker = if truncated { "\n\n[内容已截断...]" } else { "" };
    format!(
        r#"你是一个专业的金融分析师，需要为微信群分享创建内容详实、论据充分的研报总结。

报告文件名：{}

文档内容：
{}{}

请输出不超过 300 字的微信分享摘要，要求：
1. 首行注明发布机构与分析对象
2. 给出核心结论：投资评级与目标价（如有）
3. 提炼 2-3 个支撑论据，必须包含具体数据
4. 删除所有风险提示、免责声明和冗余背景"#,
        filename, body, marker
    )
}

impl Summarizer {
    /// WeChat share-format summary: a compact card (≤300 chars) suitable
    /// for pasting into a group chat.
    ///
    /// Same provider chain as [`Summarizer::summarize`]; when every
    /// provider fails, a local extract of the document's leading key
    /// sentences is used instead. Never fails.
    pub fn wechat_summary(&self, text: &str, filename: &str) -> String {
        let prompt = wechat_prompt(text, filename, 15_000);
        match self.chat_once(&prompt) {
            Some((body, provider)) => {
                info!(provider = %provider, "wechat summary generated");
                clamp_chars(body.trim(), WECHAT_MAX_CHARS)
            }
            None => {
                warn!("all providers failed, using local wechat fallback");
                wechat_fallback(text, filename)
            }
        }
    }
}

/// 本地兜底：文件名标题 + 规则摘要里的头几条要点
fn wechat_fallback(text: &str, filename: &str) -> String {
    let summary = fallback::fallback_summary(text);
    let mut lines = vec![format!("【研报分享】{}", filename)];
    lines.extend(summary.key_points.iter().take(2).cloned());
    lines.extend(summary.financial_data.iter().take(2).cloned());
    if lines.len() == 1 {
        lines.extend(summary.insights.iter().take(2).cloned());
    }
    clamp_chars(&lines.join("\n"), WECHAT_MAX_CHARS)
}

/// Cut to at most `max` characters (not bytes)
fn clamp_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_counts_chars_not_bytes() {
        let text = "研".repeat(400);
        let clamped = clamp_chars(&text, WECHAT_MAX_CHARS);
        assert_eq!(clamped.chars().count(), WECHAT_MAX_CHARS);
    }

    #[test]
    fn test_fallback_includes_filename_header() {
        let card = wechat_fallback("维持买入评级。目标价 15.6 港元。", "q3_report.pdf");
        assert!(card.starts_with("【研报分享】q3_report.pdf"));
        assert!(card.contains("买入"));
    }

    #[test]
    fn test_fallback_respects_length_cap() {
        let long = "公司维持增持评级，逻辑充分且论据完备，值得长期关注配置。".repeat(40);
        let card = wechat_fallback(&long, "long.pdf");
        assert!(card.chars().count() <= WECHAT_MAX_CHARS);
    }

    #[test]
    fn test_unreachable_provider_uses_local_card() {
        let summarizer = Summarizer::new(vec![super::super::ProviderConfig {
            name: "Dead".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "none".to_string(),
            api_key: "k".to_string(),
            max_input_chars: 1000,
        }])
        .unwrap();
        let card = summarizer.wechat_summary("维持买入评级。", "r.pdf");
        assert!(card.starts_with("【研报分享】"));
    }

    #[test]
    fn test_prompt_embeds_filename() {
        let prompt = wechat_prompt("正文", "q3.pdf", 1000);
        assert!(prompt.contains("q3.pdf"));
        assert!(prompt.contains("微信"));
    }
}
