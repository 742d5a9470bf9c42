use serde::{Deserialize, Serialize};

/// Where a summary came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SummarySource {
    /// Produced by an LLM provider (name as configured, e.g. "DeepSeek")
    Ai { provider: String },
    /// Locally computed heuristic substitute after every provider failed
    Fallback,
}

/// Structured Chinese summary of one report.
///
/// The four sections are fixed; every constructor guarantees all four are
/// present, possibly as empty lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    /// 主要观点
    pub key_points: Vec<String>,
    /// 核心财务数据
    pub financial_data: Vec<String>,
    /// 关键洞察
    pub insights: Vec<String>,
    /// 重要风险
    pub risks: Vec<String>,
    pub source: SummarySource,
}

impl SummaryResult {
    /// Empty summary attributed to the given source
    pub fn empty(source: SummarySource) -> Self {
        Self {
            key_points: Vec::new(),
            financial_data: Vec::new(),
            insights: Vec::new(),
            risks: Vec::new(),
            source,
        }
    }

    /// True when an LLM produced this summary (vs the local fallback)
    pub fn is_ai(&self) -> bool {
        matches!(self.source, SummarySource::Ai { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.key_points.is_empty()
            && self.financial_data.is_empty()
            && self.insights.is_empty()
            && self.risks.is_empty()
    }

    /// Sections in display order as (标题, items) pairs
    pub fn sections(&self) -> [(&'static str, &[String]); 4] {
        [
            ("主要观点", self.key_points.as_slice()),
            ("核心财务数据", self.financial_data.as_slice()),
            ("关键洞察", self.insights.as_slice()),
            ("重要风险", self.risks.as_slice()),
        ]
    }
}
