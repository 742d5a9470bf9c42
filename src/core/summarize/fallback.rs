use std::sync::OnceLock;

use regex::Regex;

use crate::models::{SummaryResult, SummarySource};

/// 每个小节最多保留的句子数
const MAX_ITEMS_PER_SECTION: usize = 3;
/// 过短的句子（噪声、页码等）直接丢弃
const MIN_SENTENCE_CHARS: usize = 6;

fn financial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[¥$€£%]|人民币|港元|美元|亿|万元|百万|目标价|市盈率|P/?E|EPS|营收|净利|毛利")
            .expect("valid financial regex")
    })
}

fn risk_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"风险|下行|不确定|挑战|压力|减值|(?i)risk").expect("valid risk regex")
    })
}

fn rating_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"买入|增持|中性|减持|卖出|评级|推荐|建议|(?i)\b(buy|sell|hold|overweight|underweight)\b")
            .expect("valid rating regex")
    })
}

/// 本地规则式摘要：AI 全部失败后的兜底。
///
/// 永不失败 —— 任何输入（包括空串）都返回四个小节齐全的结果，
/// 匹配不到内容时对应小节为空列表。分类规则是粗糙的关键词启发式，
/// 只求给收件人一个可读的最低限度摘要。
pub fn fallback_summary(text: &str) -> SummaryResult {
    let mut summary = SummaryResult::empty(SummarySource::Fallback);

    for sentence in split_sentences(text) {
        if risk_re().is_match(&sentence) {
            push_capped(&mut summary.risks, sentence);
        } else if rating_re().is_match(&sentence) {
            push_capped(&mut summary.key_points, sentence);
        } else if financial_re().is_match(&sentence) {
            push_capped(&mut summary.financial_data, sentence);
        } else {
            push_capped(&mut summary.insights, sentence);
        }
    }

    summary
}

fn push_capped(items: &mut Vec<String>, sentence: String) {
    if items.len() < MAX_ITEMS_PER_SECTION {
        items.push(sentence);
    }
}

/// Split on CJK and Latin sentence terminators plus line breaks
fn split_sentences(text: &str) -> Vec<String> {
    text.split(['。', '！', '？', '；', '.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_all_four_sections() {
        let summary = fallback_summary("");
        assert!(summary.is_empty());
        assert_eq!(summary.sections().len(), 4);
        assert_eq!(summary.source, SummarySource::Fallback);
    }

    #[test]
    fn test_currency_sentences_go_to_financial() {
        let summary = fallback_summary("公司全年营收达到 42 亿元，同比增长 18%。");
        assert_eq!(summary.financial_data.len(), 1);
        assert!(summary.financial_data[0].contains("42 亿元"));
    }

    #[test]
    fn test_risk_sentences_go_to_risks() {
        let summary = fallback_summary("原材料价格波动构成主要下行风险。");
        assert_eq!(summary.risks.len(), 1);
        assert!(summary.key_points.is_empty());
    }

    #[test]
    fn test_rating_sentences_go_to_key_points() {
        let summary = fallback_summary("维持买入评级，看好长期竞争格局。");
        assert_eq!(summary.key_points.len(), 1);
    }

    #[test]
    fn test_plain_sentences_go_to_insights() {
        let summary = fallback_summary("行业集中度持续提升，头部厂商话语权增强。");
        assert_eq!(summary.insights.len(), 1);
    }

    #[test]
    fn test_section_caps_are_enforced() {
        let text = "下行风险一存在。下行风险二存在。下行风险三存在。下行风险四存在。下行风险五存在。";
        let summary = fallback_summary(text);
        assert_eq!(summary.risks.len(), MAX_ITEMS_PER_SECTION);
    }

    #[test]
    fn test_short_fragments_are_dropped() {
        let summary = fallback_summary("第3页。完。目录。");
        assert!(summary.is_empty());
    }

    #[test]
    fn test_never_panics_on_arbitrary_input() {
        for text in ["\u{0}\u{1}\u{2}", "。。。。。", "   \n\t  ", "a。b！c？"] {
            let summary = fallback_summary(text);
            assert_eq!(summary.sections().len(), 4);
        }
    }

    #[test]
    fn test_mixed_document_fills_multiple_sections() {
        let text = "公司维持增持评级。目标价上调至 15.6 港元。\
                    行业渗透率仍有翻倍空间，供给端格局清晰。\
                    需关注海外需求走弱带来的不确定性。";
        let summary = fallback_summary(text);
        assert!(!summary.key_points.is_empty());
        assert!(!summary.financial_data.is_empty());
        assert!(!summary.insights.is_empty());
        assert!(!summary.risks.is_empty());
    }
}
