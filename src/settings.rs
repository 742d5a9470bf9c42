//! Application settings storage
//!
//! Credentials and provider endpoints live in a JSON file
//! (`~/.config/report-cleaner/settings.json` by default). Environment
//! variables override file values for the secrets, so CI and one-off runs
//! never need the file on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::email::SmtpConfig;
use crate::core::summarize::ProviderConfig;
use crate::models::ReportError;

/// 默认收件人（生产流程的固定分发对象）
pub const DEFAULT_RECIPIENT: &str = "charles.song@gtjas.com.hk";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// LLM providers tried in order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default = "default_smtp")]
    pub smtp: SmtpConfig,
    #[serde(default = "default_recipient")]
    pub default_recipient: String,
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::deepseek(""), ProviderConfig::qwen("")]
}

fn default_smtp() -> SmtpConfig {
    SmtpConfig {
        host: "smtp.gmail.com".to_string(),
        port: 587,
        account: String::new(),
        username: String::new(),
        password: String::new(),
    }
}

fn default_recipient() -> String {
    DEFAULT_RECIPIENT.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            smtp: default_smtp(),
            default_recipient: default_recipient(),
        }
    }
}

impl Settings {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("report-cleaner")
            .join("settings.json")
    }

    /// Load settings from disk (defaults when the file is missing), then
    /// apply environment overrides.
    ///
    /// 环境变量优先：`DEEPSEEK_API_KEY` / `QWEN_API_KEY` / `SMTP_PASSWORD`
    /// 覆盖文件中的同名凭据，避免把密钥写进磁盘配置。
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let mut settings = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                ReportError::InvalidConfig(format!("配置文件解析失败 {}: {}", path.display(), e))
            })?
        } else {
            debug!(path = %path.display(), "settings file missing, using defaults");
            Settings::default()
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        for provider in &mut self.providers {
            let var = format!("{}_API_KEY", provider.name.to_uppercase());
            if let Ok(key) = std::env::var(&var) {
                if !key.is_empty() {
                    provider.api_key = key;
                }
            }
        }
        if let Ok(password) = std::env::var("SMTP_PASSWORD") {
            if !password.is_empty() {
                self.smtp.password = password;
            }
        }
    }

    /// Save settings to disk, creating the parent directory as needed
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            ReportError::InvalidConfig(format!("配置序列化失败: {}", e))
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.providers.len(), 2);
        assert_eq!(settings.providers[0].name, "DeepSeek");
        assert_eq!(settings.smtp.host, "smtp.gmail.com");
        assert_eq!(settings.default_recipient, DEFAULT_RECIPIENT);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("settings.json");

        let mut settings = Settings::default();
        settings.smtp.account = "robot@example.com".to_string();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.smtp.account, "robot@example.com");
    }

    #[test]
    fn test_garbage_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(ReportError::InvalidConfig(_))
        ));
    }
}
