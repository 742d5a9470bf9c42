use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::ReportError;

/// One OpenAI-compatible chat-completions backend.
///
/// DeepSeek 与 Qwen（DashScope compatible-mode）均走此协议；
/// 按配置顺序逐个尝试，每个只调用一次，不重试。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Display name, e.g. "DeepSeek"
    pub name: String,
    /// API root, e.g. "https://api.deepseek.com"
    pub base_url: String,
    /// Model id, e.g. "deepseek-chat"
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    /// Document text is truncated to this many bytes before prompting
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_max_input_chars() -> usize {
    20_000
}

impl ProviderConfig {
    /// DeepSeek preset (primary provider in production)
    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self {
            name: "DeepSeek".to_string(),
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: api_key.into(),
            max_input_chars: 20_000,
        }
    }

    /// Alibaba Qwen preset via the DashScope OpenAI-compatible endpoint
    pub fn qwen(api_key: impl Into<String>) -> Self {
        Self {
            name: "Qwen".to_string(),
            base_url: "https://dashscope-intl.aliyuncs.com/compatible-mode/v1".to_string(),
            model: "qwen-plus".to_string(),
            api_key: api_key.into(),
            max_input_chars: 15_000,
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// OpenAI-compatible wire format

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Blocking chat-completions client.
///
/// One synchronous request per call; the GUI-era tool made the same
/// blocking call from a worker thread, and the pipeline is sequential by
/// design, so no async runtime is carried.
pub struct ChatClient {
    http: reqwest::blocking::Client,
}

/// 与原生产参数一致：低温度、固定输出上限
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

impl ChatClient {
    pub fn new() -> Result<Self, ReportError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReportError::Summarization(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { http })
    }

    /// Issue one chat request and return the assistant text.
    ///
    /// Transport errors, non-success statuses, and empty responses all map
    /// to `Summarization`; the caller decides whether to move on to the
    /// next provider.
    pub fn chat(
        &self,
        provider: &ProviderConfig,
        system: &str,
        user: &str,
    ) -> Result<String, ReportError> {
        let request = ChatRequest {
            model: provider.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(provider.completions_url())
            .bearer_auth(&provider.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                ReportError::Summarization(format!("{} 请求失败: {}", provider.name, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ReportError::Summarization(format!(
                "{} API error {}: {}",
                provider.name, status, body
            )));
        }

        let parsed: ChatResponse = response.json().map_err(|e| {
            ReportError::Summarization(format!("{} 响应解析失败: {}", provider.name, e))
        })?;

        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ReportError::Summarization(format!(
                "{} 返回了空响应",
                provider.name
            )));
        }
        Ok(text)
    }
}
