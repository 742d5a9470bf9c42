// AI summarization modules
pub mod client;
pub mod fallback;
pub mod wechat;

use tracing::{info, warn};

use crate::models::{ReportError, SummaryResult, SummarySource};

pub use client::{ChatClient, ProviderConfig};
pub use fallback::fallback_summary;

/// System role shared by every provider (原生产提示词)
const SYSTEM_PROMPT: &str = "你是一个专业的金融分析师和文档总结专家。";

/// 截断标记，附在被裁剪的文档末尾
const TRUNCATION_MARKER: &str = "\n\n[内容已截断...]";

/// 研报摘要器：按顺序尝试各 LLM 后端，全部失败时退回本地启发式。
///
/// ## 失败策略
///
/// 每个后端只调用一次（不重试）；网络错误、非 2xx 状态、空响应或
/// 无法解析的响应都视为该后端失败，转向下一个。链条耗尽后调用
/// `fallback_summary`，因此 `summarize` 永不返回错误 —— 调用方通过
/// `SummaryResult::source` 区分 AI 结果与兜底结果。
pub struct Summarizer {
    providers: Vec<ProviderConfig>,
    client: ChatClient,
}

impl Summarizer {
    pub fn new(providers: Vec<ProviderConfig>) -> Result<Self, ReportError> {
        Ok(Self {
            providers,
            client: ChatClient::new()?,
        })
    }

    /// Summarize extracted document text into the fixed four sections.
    /// Never fails; see the failure policy above.
    pub fn summarize(&self, text: &str) -> SummaryResult {
        for provider in self.providers.iter().filter(|p| p.has_key()) {
            info!(provider = %provider.name, "requesting AI summary");
            let prompt = build_prompt(text, provider.max_input_chars);
            match self.client.chat(provider, SYSTEM_PROMPT, &prompt) {
                Ok(body) => match parse_summary(&body, &provider.name) {
                    Ok(summary) => return summary,
                    Err(e) => warn!(provider = %provider.name, error = %e, "unparsable summary"),
                },
                Err(e) => warn!(provider = %provider.name, error = %e, "provider failed"),
            }
        }

        warn!("all providers failed, using local fallback summary");
        fallback_summary(text)
    }

    pub(crate) fn chat_once(&self, prompt: &str) -> Option<(String, String)> {
        for provider in self.providers.iter().filter(|p| p.has_key()) {
            match self.client.chat(provider, SYSTEM_PROMPT, prompt) {
                Ok(body) => return Some((body, provider.name.clone())),
                Err(e) => warn!(provider = %provider.name, error = %e, "provider failed"),
            }
        }
        None
    }
}

/// Build the four-section Chinese prompt with the document text embedded,
/// truncated at a UTF-8 boundary when it exceeds the provider's limit.
fn build_prompt(text: &str, max_chars: usize) -> String {
    let (body, truncated) = truncate_utf8(text, max_chars);
    let marker = if truncated { TRUNCATION_MARKER } else { "" };
    format!(
        r#"你是一个专业的金融分析师和文档总结专家。请仔细分析以下PDF文档内容，并以中文提供详细、结构化的总结。

文档内容：
{}{}

请按以下格式提供中文总结：
## 主要观点
- 核心论点
- 投资建议
- 风险因素

## 核心财务数据
- 目标价格/评级
- 关键财务表现
- 重要数字和指标

## 关键洞察
- 市场趋势分析
- 行业前景
- 竞争优势

## 重要风险
- 主要风险点
- 不确定性因素

请确保总结准确、全面，并且易于理解。如果文档是英文的，请将所有关键信息翻译成中文。"#,
        body, marker
    )
}

/// Cut at or before `max` bytes on a char boundary; flags whether anything
/// was dropped
fn truncate_utf8(text: &str, max: usize) -> (&str, bool) {
    if text.len() <= max {
        return (text, false);
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}

/// Parse an LLM response into the four fixed sections.
///
/// Headers arrive as `## 主要观点` or the bold variant `**## 主要观点**`;
/// bullet lines (`- `) and bare lines below a header become items. A
/// response without a single recognized header is unparsable.
fn parse_summary(body: &str, provider: &str) -> Result<SummaryResult, ReportError> {
    let mut summary = SummaryResult::empty(SummarySource::Ai {
        provider: provider.to_string(),
    });
    let mut current: Option<usize> = None;
    let mut matched_any = false;

    for raw_line in body.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(section) = header_section(line) {
            current = Some(section);
            matched_any = true;
            continue;
        }
        let Some(section) = current else {
            continue;
        };
        let item = line
            .trim_start_matches("- ")
            .trim_start_matches('•')
            .trim()
            .replace("**", "");
        if item.is_empty() {
            continue;
        }
        let target = match section {
            0 => &mut summary.key_points,
            1 => &mut summary.financial_data,
            2 => &mut summary.insights,
            _ => &mut summary.risks,
        };
        target.push(item);
    }

    if !matched_any {
        return Err(ReportError::Summarization(format!(
            "{} 响应中没有任何已知小节标题",
            provider
        )));
    }
    Ok(summary)
}

/// Section index for a header line, if it names one of the four sections
fn header_section(line: &str) -> Option<usize> {
    if !line.starts_with("##") && !line.starts_with("**##") {
        return None;
    }
    let title = line.trim_matches(|c| c == '#' || c == '*' || c == ' ');
    const TITLES: [&str; 4] = ["主要观点", "核心财务数据", "关键洞察", "重要风险"];
    TITLES.iter().position(|t| title.starts_with(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "\
## 主要观点
- 维持买入评级
- 受益于行业集中度提升

## 核心财务数据
- 目标价 15.6 港元
- 2025E 营收 42 亿元

## 关键洞察
- 渠道库存已回落至健康水位

## 重要风险
- 海外需求走弱
";

    #[test]
    fn test_parse_well_formed_response() {
        let summary = parse_summary(RESPONSE, "DeepSeek").unwrap();
        assert_eq!(summary.key_points.len(), 2);
        assert_eq!(summary.financial_data.len(), 2);
        assert_eq!(summary.insights, vec!["渠道库存已回落至健康水位"]);
        assert_eq!(summary.risks, vec!["海外需求走弱"]);
        assert_eq!(
            summary.source,
            SummarySource::Ai {
                provider: "DeepSeek".to_string()
            }
        );
    }

    #[test]
    fn test_parse_bold_header_variant() {
        let body = "**## 主要观点**\n- 观点一\n**## 重要风险**\n- 风险一\n";
        let summary = parse_summary(body, "Qwen").unwrap();
        assert_eq!(summary.key_points, vec!["观点一"]);
        assert_eq!(summary.risks, vec!["风险一"]);
        assert!(summary.financial_data.is_empty());
        assert!(summary.insights.is_empty());
    }

    #[test]
    fn test_parse_strips_bold_markers_in_items() {
        let body = "## 核心财务数据\n- **目标价:** 15.6 港元\n";
        let summary = parse_summary(body, "DeepSeek").unwrap();
        assert_eq!(summary.financial_data, vec!["目标价: 15.6 港元"]);
    }

    #[test]
    fn test_parse_rejects_headerless_response() {
        assert!(parse_summary("抱歉，我无法处理该请求。", "DeepSeek").is_err());
        assert!(parse_summary("", "DeepSeek").is_err());
    }

    #[test]
    fn test_truncation_marker_added_only_when_needed() {
        let long_text = "报".repeat(10_000);
        let prompt = build_prompt(&long_text, 300);
        assert!(prompt.contains("[内容已截断...]"));

        let prompt = build_prompt("短文档", 300);
        assert!(!prompt.contains("[内容已截断...]"));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // "报" is 3 bytes; 100 is not a boundary of a 3-byte sequence run
        let text = "报".repeat(50);
        let (cut, truncated) = truncate_utf8(&text, 100);
        assert!(truncated);
        assert!(cut.len() <= 100);
        assert!(std::str::from_utf8(cut.as_bytes()).is_ok());
    }

    #[test]
    fn test_unreachable_providers_fall_back_locally() {
        let providers = vec![
            ProviderConfig {
                name: "DeadPrimary".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
                model: "none".to_string(),
                api_key: "k".to_string(),
                max_input_chars: 1000,
            },
            ProviderConfig {
                name: "DeadSecondary".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
                model: "none".to_string(),
                api_key: "k".to_string(),
                max_input_chars: 1000,
            },
        ];
        let summarizer = Summarizer::new(providers).unwrap();
        let summary = summarizer.summarize("公司全年营收达到 42 亿元，同比增长 18%。");

        assert_eq!(summary.source, SummarySource::Fallback);
        assert!(!summary.financial_data.is_empty());
    }

    #[test]
    fn test_keyless_providers_are_skipped() {
        let summarizer = Summarizer::new(vec![ProviderConfig::deepseek("")]).unwrap();
        let summary = summarizer.summarize("维持买入评级。");
        assert_eq!(summary.source, SummarySource::Fallback);
    }

    #[test]
    fn test_no_providers_still_summarizes() {
        let summarizer = Summarizer::new(vec![]).unwrap();
        let summary = summarizer.summarize("");
        assert_eq!(summary.source, SummarySource::Fallback);
        assert!(summary.is_empty());
    }
}
